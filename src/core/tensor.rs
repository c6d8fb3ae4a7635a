use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::layout::{coord_permutation, layout_to_strides, TensorLayout};
use crate::core::types::DataType;

fn default_vector_length() -> usize {
    1
}

/// Shape, stride and element-type description of a dense tensor.
///
/// Lengths are kept in N, C, spatial order for every layout except the
/// vectorized CHWNc family, which stores them as C, H, W, N. Non-default
/// layouts express themselves through strides; the tag alone does not
/// reorder lengths. Strides count stored elements, not bytes. For
/// vectorized layouts one stored element holds `vector_length` values and
/// the channel-carrying length is divided by that factor when strides are
/// derived, so `lengths()` reports outer counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorDescriptor {
    #[serde(rename = "lengths")]
    lens: Vec<usize>,
    strides: Vec<usize>,
    packed: bool,
    #[serde(rename = "type")]
    ty: DataType,
    #[serde(default)]
    layout: TensorLayout,
    #[serde(default = "default_vector_length")]
    vector_length: usize,
}

impl TensorDescriptor {
    /// Packed scalar NCHW descriptor with derived strides.
    pub fn new(ty: DataType, lens: Vec<usize>) -> Self {
        Self::with_layout(ty, TensorLayout::NCHW, lens)
    }

    /// Packed descriptor with strides derived for `layout`. For vectorized
    /// layouts the vector-carrying length is divided in place, so pass the
    /// full (pre-division) channel count.
    pub fn with_layout(ty: DataType, layout: TensorLayout, lens: Vec<usize>) -> Self {
        let mut desc = Self {
            lens,
            strides: Vec::new(),
            packed: false,
            ty,
            layout,
            vector_length: layout.vector_length(),
        };
        desc.calculate_strides();
        // Derived strides telescope to a packed tensor unless a length is 0.
        desc.packed = desc.element_count() == desc.element_space();
        desc
    }

    /// Descriptor with caller-supplied strides. Packedness is recomputed from
    /// the given geometry. Lengths are not rewritten here even for vectorized
    /// layouts; explicit strides mean the caller owns the geometry.
    pub fn with_strides(ty: DataType, lens: Vec<usize>, strides: Vec<usize>) -> Result<Self, String> {
        Self::with_layout_strides(ty, TensorLayout::NCHW, lens, strides)
    }

    pub fn with_layout_strides(
        ty: DataType,
        layout: TensorLayout,
        lens: Vec<usize>,
        strides: Vec<usize>,
    ) -> Result<Self, String> {
        if lens.len() != strides.len() {
            return Err(format!(
                "dimension mismatch: {} lengths vs {} strides",
                lens.len(),
                strides.len()
            ));
        }
        let mut desc = Self {
            lens,
            strides,
            packed: false,
            ty,
            layout,
            vector_length: layout.vector_length(),
        };
        desc.packed = desc.element_count() == desc.element_space();
        Ok(desc)
    }

    /// Builds a descriptor from possibly-signed dimension values, as handed
    /// over by C-style frontends. Negative entries are rejected.
    pub fn from_raw(
        ty: DataType,
        layout: TensorLayout,
        lens: &[i64],
        strides: Option<&[i64]>,
    ) -> Result<Self, String> {
        if lens.iter().any(|&l| l < 0) {
            return Err("invalid lengths: lengths must be non-negative".to_string());
        }
        let lens: Vec<usize> = lens.iter().map(|&l| l as usize).collect();
        match strides {
            Some(raw) => {
                if raw.iter().any(|&s| s < 0) {
                    return Err("invalid strides: strides must be non-negative".to_string());
                }
                let strides: Vec<usize> = raw.iter().map(|&s| s as usize).collect();
                Self::with_layout_strides(ty, layout, lens, strides)
            }
            None => Ok(Self::with_layout(ty, layout, lens)),
        }
    }

    // Row-major derivation in storage order. The innermost stride starts at
    // the vector factor and every coarser stride is the running product of
    // the lengths inside it, so a c4 tensor steps over whole vectors. The
    // vector-carrying length is divided first; lengths stay outer counts
    // from here on.
    fn calculate_strides(&mut self) {
        self.strides = vec![0; self.lens.len()];
        if self.strides.is_empty() {
            return;
        }
        if let Some(dim) = self.layout.vector_dim() {
            self.lens[dim] /= self.vector_length;
        }
        let mut acc = self.vector_length;
        for i in (0..self.lens.len()).rev() {
            self.strides[i] = acc;
            acc *= self.lens[i];
        }
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lens
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn ndims(&self) -> usize {
        debug_assert_eq!(self.lens.len(), self.strides.len());
        self.lens.len()
    }

    pub fn data_type(&self) -> DataType {
        self.ty
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn vector_length(&self) -> usize {
        self.vector_length
    }

    pub fn is_vectorized(&self) -> bool {
        self.vector_length > 1
    }

    /// True when every stored element is addressed exactly once, i.e. the
    /// logical element count equals the addressable span.
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    /// Number of logical values: the product of all lengths times the vector
    /// factor.
    pub fn element_count(&self) -> usize {
        self.lens.iter().product::<usize>() * self.vector_length
    }

    /// Size of the addressable span in stored elements: one past the highest
    /// reachable index. Sparse strides grow this beyond `element_count`.
    pub fn element_space(&self) -> usize {
        self.lens
            .iter()
            .zip(&self.strides)
            .map(|(&l, &s)| l.saturating_sub(1) * s)
            .sum::<usize>()
            + self.vector_length
    }

    /// Total footprint in bytes.
    pub fn num_bytes(&self) -> usize {
        self.ty.size_in_bytes() * self.element_space()
    }

    /// Flat element offset of a coordinate tuple.
    ///
    /// Scalar tensors take one coordinate per dimension. Vectorized tensors
    /// take a leading in-vector sub-index followed by one coordinate per
    /// dimension, in canonical (v, n, c, ...) order; the sub-index is added
    /// to the offset, never multiplied by a stride. Wrong arity panics.
    pub fn flat_index(&self, coords: &[usize]) -> usize {
        if self.vector_length == 1 {
            assert_eq!(
                coords.len(),
                self.lens.len(),
                "expected {} coordinates, got {}",
                self.lens.len(),
                coords.len()
            );
            coords.iter().zip(&self.strides).map(|(&c, &s)| c * s).sum()
        } else {
            assert_eq!(
                coords.len(),
                self.lens.len() + 1,
                "vectorized tensors take a leading sub-index plus {} coordinates, got {}",
                self.lens.len(),
                coords.len()
            );
            let flat: usize = match coord_permutation(self.layout) {
                Some(order) => {
                    assert_eq!(
                        self.lens.len() + 1,
                        order.len(),
                        "{:?} indexing permutes {} axes, descriptor has {}",
                        self.layout,
                        order.len() - 1,
                        self.lens.len()
                    );
                    order[1..]
                        .iter()
                        .zip(&self.strides)
                        .map(|(&src, &s)| coords[src] * s)
                        .sum()
                }
                None => coords[1..].iter().zip(&self.strides).map(|(&c, &s)| c * s).sum(),
            };
            flat + coords[0]
        }
    }

    /// Whether this descriptor's strides are exactly the ones a contiguous
    /// tensor in `layout` order would have. `labels` names the axes of
    /// `lengths()` in order.
    pub fn is_possible_layout(&self, labels: &str, layout: &str) -> Result<bool, String> {
        let derived = layout_to_strides(&self.lens, labels, layout)?;
        Ok(derived == self.strides)
    }
}

// Identity and ordering both compare (type, lengths, strides). Layout tag
// and packedness are derived state and take no part in either.
impl PartialEq for TensorDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.lens == other.lens && self.strides == other.strides
    }
}

impl Eq for TensorDescriptor {}

impl PartialOrd for TensorDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TensorDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.ty, &self.lens, &self.strides).cmp(&(other.ty, &other.lens, &other.strides))
    }
}

impl Hash for TensorDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        self.lens.hash(state);
        self.strides.hash(state);
    }
}

impl fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lens: Vec<String> = self.lens.iter().map(|l| l.to_string()).collect();
        f.write_str(&lens.join(", "))
    }
}
