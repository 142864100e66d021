use crate::dtype::Float;
use crate::error::{TensorError, TensorResult};
use crate::shape::Shape;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense tensor used for images, kernels and feature maps.
///
/// Stores data in a flat contiguous `Vec<T>` with row-major (C-order) layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> TensorResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![T::ZERO; s.numel()],
            shape: s,
        }
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: Vec<usize>, value: T) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![value; s.numel()],
            shape: s,
        }
    }

    /// An empty `0 × 0` matrix.
    pub fn empty() -> Self {
        Tensor::zeros(vec![0, 0])
    }

    /// Create a 2-D tensor from a nested slice.
    pub fn from_vec2d(data: &[Vec<T>]) -> TensorResult<Self> {
        if data.is_empty() {
            return Ok(Tensor::empty());
        }
        let rows = data.len();
        let cols = data[0].len();
        for row in data {
            if row.len() != cols {
                return Err(TensorError::InvalidOperation(
                    "All rows must have the same number of columns".to_string(),
                ));
            }
        }
        let flat: Vec<T> = data.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::new(flat, vec![rows, cols])
    }

    /// Build a `rows × cols` matrix by evaluating `f(row, col)` at every cell.
    pub fn from_fn<F: Fn(usize, usize) -> T>(rows: usize, cols: usize, f: F) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Tensor {
            data,
            shape: Shape::new(vec![rows, cols]),
        }
    }

    /// Random tensor with uniform distribution in `[low, high)`.
    ///
    /// The same seed always yields the same values.
    pub fn rand_uniform(shape: Vec<usize>, low: f64, high: f64, seed: u64) -> TensorResult<Self> {
        if !(low < high) {
            return Err(TensorError::InvalidOperation(format!(
                "uniform range is empty: [{}, {})",
                low, high
            )));
        }
        let s = Shape::new(shape);
        let mut rng = StdRng::seed_from_u64(seed);
        let data: Vec<T> = (0..s.numel())
            .map(|_| T::from_f64(rng.gen_range(low..high)))
            .collect();
        Ok(Tensor { data, shape: s })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Side length of a square matrix, `None` for anything else.
    pub fn square_side(&self) -> Option<usize> {
        self.shape.square_side()
    }

    /// Multi-dimensional indexing: compute flat offset from indices.
    fn offset(&self, indices: &[usize]) -> TensorResult<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::DimensionMismatch {
                expected: vec![self.ndim()],
                got: vec![indices.len()],
            });
        }
        let mut offset = 0;
        for (axis, &idx) in indices.iter().enumerate() {
            let dim_size = self.shape.dim(axis)?;
            if idx >= dim_size {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    axis,
                    size: dim_size,
                });
            }
            offset = offset * dim_size + idx;
        }
        Ok(offset)
    }

    /// Get a single element.
    pub fn get(&self, indices: &[usize]) -> TensorResult<T> {
        let offset = self.offset(indices)?;
        Ok(self.data[offset])
    }

    /// Rows of a 2-D tensor as nested vectors.
    pub fn to_vec2d(&self) -> TensorResult<Vec<Vec<T>>> {
        if self.ndim() != 2 {
            return Err(TensorError::InvalidOperation(
                "to_vec2d() requires a 2D tensor".to_string(),
            ));
        }
        let cols = self.shape.dim(1)?;
        if cols == 0 {
            return Ok(vec![Vec::new(); self.shape.dim(0)?]);
        }
        Ok(self.data.chunks(cols).map(|r| r.to_vec()).collect())
    }

    // ─── Shape Manipulation ─────────────────────────────────────────────────

    /// Transpose a 2-D tensor.
    pub fn t(&self) -> TensorResult<Tensor<T>> {
        let shape = self.shape.transposed()?;
        let rows = self.shape.dim(0)?;
        let cols = self.shape.dim(1)?;
        let mut data = vec![T::ZERO; self.numel()];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data[i * cols + j];
            }
        }
        Ok(Tensor { data, shape })
    }
}

impl<T: Float> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ndim() != 2 {
            return write!(f, "tensor({:?}, shape=({}))", self.data, self.shape);
        }
        let cols = self.shape.dims()[1];
        writeln!(f, "tensor([")?;
        if cols > 0 {
            for row in self.data.chunks(cols) {
                write!(f, "  [")?;
                for (j, v) in row.iter().enumerate() {
                    if j > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:.4}", v)?;
                }
                writeln!(f, "],")?;
            }
        }
        write!(f, "], shape=({}))", self.shape)
    }
}
