use convml_core::{Tensor, TensorError, TensorResult};
use serde::{Deserialize, Serialize};

/// How a layer's kernel is filled at construction.
///
/// All variants are deterministic: building the same variant twice gives the
/// same kernel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum KernelInit {
    /// `kernel[r][c] = (r + 1) * (c + 1) / 10`.
    #[default]
    Scaled,
    /// Every weight set to the same value.
    Constant(f64),
    /// Uniform weights in `[low, high)` from a seeded generator.
    Uniform { seed: u64, low: f64, high: f64 },
    /// Weights given row by row. Must be `kernel_size × kernel_size`.
    Explicit(Vec<Vec<f64>>),
}

/// The `Scaled` pattern at a single position.
pub fn scaled(row: usize, col: usize) -> f64 {
    ((row + 1) * (col + 1)) as f64 / 10.0
}

impl KernelInit {
    /// Materialize a `kernel_size × kernel_size` kernel.
    pub fn build(&self, kernel_size: usize) -> TensorResult<Tensor<f64>> {
        match self {
            KernelInit::Scaled => Ok(Tensor::from_fn(kernel_size, kernel_size, scaled)),
            KernelInit::Constant(v) => Ok(Tensor::full(vec![kernel_size, kernel_size], *v)),
            KernelInit::Uniform { seed, low, high } => {
                Tensor::rand_uniform(vec![kernel_size, kernel_size], *low, *high, *seed)
            }
            KernelInit::Explicit(rows) => {
                let kernel = Tensor::from_vec2d(rows)
                    .map_err(|e| TensorError::InvalidDimension(format!("explicit kernel: {}", e)))?;
                if kernel.square_side() != Some(kernel_size) {
                    return Err(TensorError::InvalidDimension(format!(
                        "explicit kernel is {}, expected {} x {}",
                        kernel.shape(),
                        kernel_size,
                        kernel_size
                    )));
                }
                Ok(kernel)
            }
        }
    }
}
