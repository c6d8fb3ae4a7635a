use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::layout::{layout_to_strides, TensorLayout};
use crate::core::tensor::TensorDescriptor;
use crate::core::types::DataType;

/// Which of the three convolution gradients is being solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    BackwardData,
    BackwardWeights,
}

impl Direction {
    pub fn tag(&self) -> &'static str {
        match self {
            Direction::Forward => "F",
            Direction::BackwardData => "BD",
            Direction::BackwardWeights => "BW",
        }
    }
}

/// Per-axis convolution parameters. All vectors have one entry per spatial
/// axis (two for 2D convolutions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvolutionDescriptor {
    pub pads: Vec<usize>,
    pub strides: Vec<usize>,
    pub dilations: Vec<usize>,
    pub group_count: usize,
}

impl ConvolutionDescriptor {
    pub fn new_2d(pad: usize, stride: usize, dilation: usize) -> Self {
        Self {
            pads: vec![pad; 2],
            strides: vec![stride; 2],
            dilations: vec![dilation; 2],
            group_count: 1,
        }
    }

    pub fn with_groups(mut self, group_count: usize) -> Self {
        self.group_count = group_count;
        self
    }

    pub fn spatial_dims(&self) -> usize {
        self.strides.len()
    }

    /// Output extent along one spatial axis for input extent `len` and
    /// filter extent `filter`. Fails on degenerate geometry: a zero stride
    /// or filter, or a dilated filter wider than the padded input.
    pub fn output_len(&self, axis: usize, len: usize, filter: usize) -> Result<usize, String> {
        let pad = self.pads[axis];
        let stride = self.strides[axis];
        let dilation = self.dilations[axis];
        if stride == 0 {
            return Err(format!("zero stride on spatial axis {}", axis));
        }
        if filter == 0 {
            return Err(format!("zero filter extent on spatial axis {}", axis));
        }
        let padded = len + 2 * pad;
        let span = dilation * (filter - 1) + 1;
        if span > padded {
            return Err(format!(
                "filter spans {} elements but the padded input has {} on spatial axis {}",
                span, padded, axis
            ));
        }
        Ok((padded - span) / stride + 1)
    }

    pub fn is_unit(&self) -> bool {
        self.strides.iter().all(|&s| s == 1) && self.dilations.iter().all(|&d| d == 1)
    }
}

impl Default for ConvolutionDescriptor {
    fn default() -> Self {
        Self::new_2d(0, 1, 1)
    }
}

/// One convolution instance: the three tensors plus the convolution
/// parameters and direction. This is the unit solvers gate on and the unit
/// the tuning database keys records by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    pub direction: Direction,
    pub input: TensorDescriptor,
    pub weights: TensorDescriptor,
    pub output: TensorDescriptor,
    pub conv: ConvolutionDescriptor,
}

impl ProblemDescriptor {
    pub fn new(
        direction: Direction,
        input: TensorDescriptor,
        weights: TensorDescriptor,
        output: TensorDescriptor,
        conv: ConvolutionDescriptor,
    ) -> Self {
        Self {
            direction,
            input,
            weights,
            output,
            conv,
        }
    }

    /// Convenience constructor for a forward 2D convolution: input
    /// `n x c x h x w`, weights `k x c x r x s`, output shape computed from
    /// the convolution parameters.
    ///
    /// Supports the NCHW, NHWC and NCHWc layouts. NHWC keeps lengths in
    /// N, C, H, W order and carries the layout in its strides; NCHWc divides
    /// the channel lengths by the vector factor. Weights stay packed KCRS
    /// except under NCHWc, where they vectorize with the activations. For
    /// anything more exotic build the descriptors by hand and use [`new`].
    ///
    /// [`new`]: ProblemDescriptor::new
    #[allow(clippy::too_many_arguments)]
    pub fn conv2d_fwd(
        ty: DataType,
        layout: TensorLayout,
        n: usize,
        c: usize,
        h: usize,
        w: usize,
        k: usize,
        r: usize,
        s: usize,
        conv: ConvolutionDescriptor,
    ) -> Result<Self, String> {
        if conv.spatial_dims() != 2 {
            return Err(format!(
                "conv2d problems take 2 spatial axes, descriptor has {}",
                conv.spatial_dims()
            ));
        }
        let out_h = conv.output_len(0, h, r)?;
        let out_w = conv.output_len(1, w, s)?;

        let (input, weights, output) = match layout {
            TensorLayout::NCHW => (
                TensorDescriptor::new(ty, vec![n, c, h, w]),
                TensorDescriptor::new(ty, vec![k, c, r, s]),
                TensorDescriptor::new(ty, vec![n, k, out_h, out_w]),
            ),
            TensorLayout::NHWC => {
                let nhwc = |lens: Vec<usize>| -> Result<TensorDescriptor, String> {
                    let strides = layout_to_strides(&lens, "NCHW", "NHWC")?;
                    TensorDescriptor::with_layout_strides(ty, TensorLayout::NHWC, lens, strides)
                };
                (
                    nhwc(vec![n, c, h, w])?,
                    TensorDescriptor::new(ty, vec![k, c, r, s]),
                    nhwc(vec![n, k, out_h, out_w])?,
                )
            }
            TensorLayout::NCHWc4 | TensorLayout::NCHWc8 => (
                TensorDescriptor::with_layout(ty, layout, vec![n, c, h, w]),
                TensorDescriptor::with_layout(ty, layout, vec![k, c, r, s]),
                TensorDescriptor::with_layout(ty, layout, vec![n, k, out_h, out_w]),
            ),
            other => {
                return Err(format!(
                    "no conv2d convenience construction for layout {:?}",
                    other
                ))
            }
        };

        Ok(Self {
            direction: Direction::Forward,
            input,
            weights,
            output,
            conv,
        })
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    fn axis_len(desc: &TensorDescriptor, label: char) -> usize {
        let axes = match desc.layout() {
            TensorLayout::CHWNc4 | TensorLayout::CHWNc8 => "CHWN",
            _ if desc.ndims() == 5 => "NCDHW",
            _ => "NCHW",
        };
        axes.chars()
            .position(|a| a == label)
            .and_then(|i| desc.lengths().get(i).copied())
            .unwrap_or(0)
    }

    /// Batch size, read from the input descriptor.
    pub fn batch(&self) -> usize {
        Self::axis_len(&self.input, 'N')
    }

    /// Stored channel count of the input. For vectorized layouts this is the
    /// outer (divided) count.
    pub fn in_channels(&self) -> usize {
        Self::axis_len(&self.input, 'C')
    }

    /// Stored channel count of the output.
    pub fn out_channels(&self) -> usize {
        Self::axis_len(&self.output, 'C')
    }

    pub fn in_spatial(&self) -> (usize, usize) {
        (
            Self::axis_len(&self.input, 'H'),
            Self::axis_len(&self.input, 'W'),
        )
    }

    pub fn out_spatial(&self) -> (usize, usize) {
        (
            Self::axis_len(&self.output, 'H'),
            Self::axis_len(&self.output, 'W'),
        )
    }

    /// Filter spatial extents, straight from the weights descriptor (KCRS).
    pub fn filter_spatial(&self) -> (usize, usize) {
        let lens = self.weights.lengths();
        match lens.len() {
            4 => (lens[2], lens[3]),
            _ => (0, 0),
        }
    }

    /// Stable identity string for this problem, used as the tuning database
    /// key. Two problems with the same signature are interchangeable as far
    /// as tuning results go.
    pub fn signature(&self) -> String {
        let dims = |d: &TensorDescriptor| {
            d.lengths()
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join("x")
        };
        let seq = |v: &[usize]| {
            v.iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join("x")
        };
        format!(
            "{}_{}_{}_in{}_w{}_p{}_s{}_d{}_g{}",
            self.direction.tag(),
            self.input.data_type(),
            self.input.layout().label(),
            dims(&self.input),
            dims(&self.weights),
            seq(&self.conv.pads),
            seq(&self.conv.strides),
            seq(&self.conv.dilations),
            self.conv.group_count,
        )
    }
}

impl fmt::Display for ProblemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}
