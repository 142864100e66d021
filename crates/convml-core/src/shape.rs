use crate::error::{TensorError, TensorResult};
use serde::{Deserialize, Serialize};

/// Dimensions of a tensor, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Size along a specific axis.
    pub fn dim(&self, axis: usize) -> TensorResult<usize> {
        self.dims.get(axis).copied().ok_or(TensorError::IndexOutOfBounds {
            index: axis,
            axis: 0,
            size: self.ndim(),
        })
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.clone()
    }

    /// Side length if this is a 2-D square shape.
    pub fn square_side(&self) -> Option<usize> {
        match self.dims.as_slice() {
            [r, c] if r == c => Some(*r),
            _ => None,
        }
    }

    /// Swap the two axes of a matrix shape.
    pub fn transposed(&self) -> TensorResult<Shape> {
        if self.ndim() != 2 {
            return Err(TensorError::InvalidOperation(
                "Cannot transpose a shape that is not 2-D".to_string(),
            ));
        }
        Ok(Shape::new(vec![self.dims[1], self.dims[0]]))
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}
