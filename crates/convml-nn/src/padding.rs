use convml_core::{TensorError, TensorResult};
use serde::{Deserialize, Serialize};

/// Border handling applied before the kernel slides over the image.
///
/// - `Same`: zero border of width `kernel_size / 2`; output side equals image side.
/// - `Valid`: no border; output side is `image_size - kernel_size + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddingMode {
    #[default]
    Same,
    Valid,
}

impl PaddingMode {
    /// Width of the zero border on each side.
    pub fn amount(self, kernel_size: usize) -> usize {
        match self {
            PaddingMode::Same => kernel_size / 2,
            PaddingMode::Valid => 0,
        }
    }

    /// Side of the feature map for the given sizes. Assumes `validate` passed.
    pub fn output_size(self, image_size: usize, kernel_size: usize) -> usize {
        match self {
            PaddingMode::Same => image_size,
            PaddingMode::Valid => image_size + 1 - kernel_size,
        }
    }

    /// Check that this mode can produce a feature map for the given sizes.
    pub fn validate(self, image_size: usize, kernel_size: usize) -> TensorResult<()> {
        if image_size == 0 {
            return Err(TensorError::InvalidDimension(
                "image size must be positive".to_string(),
            ));
        }
        if kernel_size == 0 {
            return Err(TensorError::InvalidDimension(
                "kernel size must be positive".to_string(),
            ));
        }
        if self == PaddingMode::Valid && kernel_size > image_size {
            return Err(TensorError::InvalidDimension(format!(
                "valid padding needs kernel size {} <= image size {}",
                kernel_size, image_size
            )));
        }
        Ok(())
    }
}
