use crate::core::layout::TensorLayout;
use crate::core::problem::{Direction, ProblemDescriptor};
use crate::core::solution::{ConvSolution, KernelInfo};
use crate::core::types::DataType;
use crate::solver::{ConvSolver, LegacyPerfConfig, LegacySolver};

/// F(2x2, 3x3) Winograd for unit-stride 3x3 forward convolutions.
///
/// Each transformed tile produces a 2x2 patch of outputs from a 4x4 input
/// window, cutting the multiply count roughly in half against direct
/// computation. The kernel predates the per-solver config types and still
/// reads its workgroup shape from the shared nine-field legacy record.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinogradFwdF2x3;

impl WinogradFwdF2x3 {
    fn filter_is_3x3(problem: &ProblemDescriptor) -> bool {
        problem.filter_spatial() == (3, 3)
    }
}

impl ConvSolver for WinogradFwdF2x3 {
    fn solver_db_id(&self) -> &'static str {
        "winograd_fwd_f2x3"
    }

    fn is_applicable(&self, problem: &ProblemDescriptor) -> bool {
        let p = problem;
        p.direction == Direction::Forward
            && p.conv.spatial_dims() == 2
            && p.conv.group_count == 1
            && p.input.ndims() == 4
            && p.input.layout() == TensorLayout::NCHW
            && p.weights.layout() == TensorLayout::NCHW
            && p.output.layout() == TensorLayout::NCHW
            && p.input.data_type() == DataType::Float
            && p.weights.data_type() == DataType::Float
            && p.output.data_type() == DataType::Float
            && p.input.is_packed()
            && p.weights.is_packed()
            && p.output.is_packed()
            && Self::filter_is_3x3(p)
            && p.conv.is_unit()
            && p.conv.pads.iter().all(|&pad| pad <= 1)
    }

    fn default_solution(&self, problem: &ProblemDescriptor) -> Result<ConvSolution, String> {
        self.solution_from_legacy_config(problem, &LegacyPerfConfig::default())
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn wti(&self, _problem: &ProblemDescriptor) -> f32 {
        2.4
    }
}

impl LegacySolver for WinogradFwdF2x3 {
    fn solution_from_legacy_config(
        &self,
        problem: &ProblemDescriptor,
        config: &LegacyPerfConfig,
    ) -> Result<ConvSolution, String> {
        if config.grp_tile0 == 0 || config.grp_tile1 == 0 {
            return Err(format!(
                "{}: legacy record carries a zero workgroup tile",
                self.solver_db_id()
            ));
        }
        let (out_h, out_w) = problem.out_spatial();
        // 2x2 outputs per Winograd tile
        let tiles_w = (out_w + 1) / 2;
        let tiles_h = (out_h + 1) / 2;
        let groups_x = (tiles_w + config.grp_tile0 - 1) / config.grp_tile0;
        let groups_y = (tiles_h + config.grp_tile1 - 1) / config.grp_tile1;

        let kernel = KernelInfo::new("winograd_fwd_f2x3")
            .with_build_options(format!(
                "-DGRP_TILE0={} -DGRP_TILE1={} -DN_STACKS={}",
                config.grp_tile0, config.grp_tile1, config.n_stacks
            ))
            .with_work(
                [
                    groups_x * config.grp_tile0,
                    groups_y * config.grp_tile1,
                    problem.batch() * problem.out_channels(),
                ],
                [config.grp_tile0, config.grp_tile1, 1],
            );
        Ok(ConvSolution::new(kernel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::problem::ConvolutionDescriptor;

    fn conv3x3(stride: usize) -> ProblemDescriptor {
        ProblemDescriptor::conv2d_fwd(
            DataType::Float,
            TensorLayout::NCHW,
            1,
            32,
            30,
            30,
            64,
            3,
            3,
            ConvolutionDescriptor::new_2d(1, stride, 1),
        )
        .unwrap()
    }

    #[test]
    fn gates_on_unit_stride_3x3() {
        assert!(WinogradFwdF2x3.is_applicable(&conv3x3(1)));
        assert!(!WinogradFwdF2x3.is_applicable(&conv3x3(2)));
    }

    #[test]
    fn rejects_wider_filters() {
        // unit stride and pad within bounds, only the filter shape differs
        let p = ProblemDescriptor::conv2d_fwd(
            DataType::Float,
            TensorLayout::NCHW,
            1,
            32,
            30,
            30,
            64,
            5,
            5,
            ConvolutionDescriptor::new_2d(1, 1, 1),
        )
        .unwrap();
        assert!(!WinogradFwdF2x3.is_applicable(&p));
    }

    #[test]
    fn zero_tile_record_is_refused() {
        let p = conv3x3(1);
        let config = LegacyPerfConfig {
            grp_tile0: 0,
            ..LegacyPerfConfig::default()
        };
        assert!(WinogradFwdF2x3.solution_from_legacy_config(&p, &config).is_err());
    }

    #[test]
    fn covers_every_output_tile() {
        let p = conv3x3(1);
        let solution = WinogradFwdF2x3
            .solution_from_legacy_config(&p, &LegacyPerfConfig::default())
            .unwrap();
        let kernel = &solution.kernels[0];
        // 30x30 outputs -> 15x15 tiles, both axes rounded to workgroups of 8
        assert_eq!(kernel.global_work[0], 16);
        assert_eq!(kernel.global_work[1], 16);
        assert_eq!(kernel.global_work[2], 64);
    }
}
