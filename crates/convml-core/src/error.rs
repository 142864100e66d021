use thiserror::Error;

/// Error type shared by the matrix storage and the layers built on it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TensorError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Index out of bounds: index {index} for axis {axis} with size {size}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type TensorResult<T> = Result<T, TensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = TensorError::DimensionMismatch {
            expected: vec![5, 5],
            got: vec![4, 4],
        };
        assert_eq!(e.to_string(), "Dimension mismatch: expected [5, 5], got [4, 4]");

        let e = TensorError::InvalidDimension("image size must be positive".to_string());
        assert_eq!(e.to_string(), "Invalid dimension: image size must be positive");
    }
}
