use crate::core::problem::{Direction, ProblemDescriptor};
use crate::core::solution::{ConvSolution, KernelInfo};
use crate::solver::ConvSolver;

/// One thread per output value, no tiling, no scratch. Slow, but it runs
/// almost anything, including the vectorized layouts, so it is the fallback
/// of last resort and the reference the fancier solvers are checked against.
///
/// The kernel reads shapes from launch arguments, one binary covers every
/// problem, hence `is_dynamic`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectFwdNaive;

impl ConvSolver for DirectFwdNaive {
    fn solver_db_id(&self) -> &'static str {
        "direct_fwd_naive"
    }

    fn is_applicable(&self, problem: &ProblemDescriptor) -> bool {
        let p = problem;
        p.direction == Direction::Forward
            && p.input.data_type() == p.weights.data_type()
            && p.input.data_type() == p.output.data_type()
            && p.input.ndims() >= 3
            && p.input.ndims() == p.output.ndims()
            && p.input.ndims() == p.weights.ndims()
            && p.conv.spatial_dims() + 2 == p.input.ndims()
            && p.output.element_count() > 0
    }

    fn default_solution(&self, problem: &ProblemDescriptor) -> Result<ConvSolution, String> {
        let threads = problem.output.element_count();
        let kernel = KernelInfo::new("naive_conv_fwd").with_work(
            [(threads + 255) / 256 * 256, 1, 1],
            [256, 1, 1],
        );
        Ok(ConvSolution::new(kernel))
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn wti(&self, _problem: &ProblemDescriptor) -> f32 {
        0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::TensorLayout;
    use crate::core::problem::ConvolutionDescriptor;
    use crate::core::types::DataType;

    #[test]
    fn accepts_vectorized_layouts() {
        let p = ProblemDescriptor::conv2d_fwd(
            DataType::Int8x4,
            TensorLayout::NCHWc4,
            1,
            16,
            8,
            8,
            32,
            3,
            3,
            ConvolutionDescriptor::new_2d(1, 1, 1),
        )
        .unwrap();
        assert!(DirectFwdNaive.is_applicable(&p));
    }

    #[test]
    fn rejects_backward_problems() {
        let p = ProblemDescriptor::conv2d_fwd(
            DataType::Float,
            TensorLayout::NCHW,
            1,
            8,
            8,
            8,
            8,
            3,
            3,
            ConvolutionDescriptor::new_2d(1, 1, 1),
        )
        .unwrap()
        .with_direction(Direction::BackwardData);
        assert!(!DirectFwdNaive.is_applicable(&p));
    }
}
