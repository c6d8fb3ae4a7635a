use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a tensor. The vectorized `Int8x4` variant packs four
/// 8-bit values into one logical element, so its per-element width is still
/// one byte; the vector factor lives in the layout, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    Float,
    Double,
    Half,
    BFloat16,
    Int8,
    Int8x4,
    Int32,
}

impl DataType {
    /// Width of a single element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::Int8 | DataType::Int8x4 => 1,
            DataType::Half | DataType::BFloat16 => 2,
            DataType::Int32 | DataType::Float => 4,
            DataType::Double => 8,
        }
    }

    /// Short tag used in problem signatures and log lines.
    pub fn short_name(&self) -> &'static str {
        match self {
            DataType::Float => "fp32",
            DataType::Double => "fp64",
            DataType::Half => "fp16",
            DataType::BFloat16 => "bf16",
            DataType::Int8 => "i8",
            DataType::Int8x4 => "i8x4",
            DataType::Int32 => "i32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_widths() {
        assert_eq!(DataType::Int8.size_in_bytes(), 1);
        assert_eq!(DataType::Int8x4.size_in_bytes(), 1);
        assert_eq!(DataType::Half.size_in_bytes(), 2);
        assert_eq!(DataType::BFloat16.size_in_bytes(), 2);
        assert_eq!(DataType::Float.size_in_bytes(), 4);
        assert_eq!(DataType::Int32.size_in_bytes(), 4);
        assert_eq!(DataType::Double.size_in_bytes(), 8);
    }

    #[test]
    fn short_names_are_stable() {
        assert_eq!(DataType::Float.to_string(), "fp32");
        assert_eq!(DataType::BFloat16.to_string(), "bf16");
    }
}
