use serde::{Deserialize, Serialize};

/// Memory layout tag for a tensor. The `c4`/`c8` families store channels
/// vectorized: four or eight channel values are packed into one element, and
/// the channel-carrying length is divided by the vector factor when strides
/// are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TensorLayout {
    #[default]
    NCHW,
    NHWC,
    CHWN,
    NCHWc4,
    NCHWc8,
    CHWNc4,
    CHWNc8,
    NCDHW,
    NDHWC,
}

impl TensorLayout {
    /// Number of values packed into one stored element. 1 for scalar layouts.
    pub fn vector_length(&self) -> usize {
        match self {
            TensorLayout::NCHWc4 | TensorLayout::CHWNc4 => 4,
            TensorLayout::NCHWc8 | TensorLayout::CHWNc8 => 8,
            _ => 1,
        }
    }

    pub fn is_vectorized(&self) -> bool {
        self.vector_length() > 1
    }

    /// Index of the length that absorbs the vector factor during stride
    /// derivation. `None` for scalar layouts.
    pub fn vector_dim(&self) -> Option<usize> {
        match self {
            TensorLayout::NCHWc4 | TensorLayout::NCHWc8 => Some(1),
            TensorLayout::CHWNc4 | TensorLayout::CHWNc8 => Some(0),
            _ => None,
        }
    }

    /// Axis label string, without the vector suffix.
    pub fn label(&self) -> &'static str {
        match self {
            TensorLayout::NCHW => "NCHW",
            TensorLayout::NHWC => "NHWC",
            TensorLayout::CHWN => "CHWN",
            TensorLayout::NCHWc4 | TensorLayout::NCHWc8 => "NCHWc",
            TensorLayout::CHWNc4 | TensorLayout::CHWNc8 => "CHWNc",
            TensorLayout::NCDHW => "NCDHW",
            TensorLayout::NDHWC => "NDHWC",
        }
    }
}

// Indexing coordinates arrive vector-first as (v, n, c, h, w). For the CHWNc
// family the strides are stored against (c, h, w, n), so the trailing four
// coordinates have to be re-read in that order. Position 0 is the in-vector
// sub-index and is added to the flat offset untouched.
const CHWNC_COORD_ORDER: [usize; 5] = [0, 2, 3, 4, 1];

pub(crate) fn coord_permutation(layout: TensorLayout) -> Option<&'static [usize; 5]> {
    match layout {
        TensorLayout::CHWNc4 | TensorLayout::CHWNc8 => Some(&CHWNC_COORD_ORDER),
        _ => None,
    }
}

/// Derives the strides a tensor with lengths `lens` (listed in `src_labels`
/// order) would have if laid out contiguously in `dst_labels` order. Each
/// stride is the product of the lengths of every axis that sits after the
/// label's position in `dst_labels`.
///
/// Labels are single ASCII characters and both strings must name the same
/// axis set. Fails when the arity disagrees or a label has no counterpart.
pub fn layout_to_strides(
    lens: &[usize],
    src_labels: &str,
    dst_labels: &str,
) -> Result<Vec<usize>, String> {
    if src_labels.len() != lens.len() {
        return Err(format!(
            "label string '{}' names {} axes but {} lengths were given",
            src_labels,
            src_labels.len(),
            lens.len()
        ));
    }
    if dst_labels.len() != src_labels.len() {
        return Err(format!(
            "layout '{}' and labels '{}' disagree on axis count",
            dst_labels, src_labels
        ));
    }

    let mut strides = Vec::with_capacity(lens.len());
    for c in src_labels.chars() {
        let pos = dst_labels
            .find(c)
            .ok_or_else(|| format!("axis '{}' does not appear in layout '{}'", c, dst_labels))?;
        let mut stride = 1usize;
        for d in dst_labels[pos + 1..].chars() {
            let idx = src_labels
                .find(d)
                .ok_or_else(|| format!("axis '{}' does not appear in labels '{}'", d, src_labels))?;
            stride *= lens[idx];
        }
        strides.push(stride);
    }
    Ok(strides)
}
