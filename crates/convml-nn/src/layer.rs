use convml_core::{Tensor, TensorResult};

/// Trait for a feed-forward layer that owns its working buffers.
pub trait Layer {
    /// Run one forward pass, replacing the layer's output.
    fn feed_forward(&mut self, input: &Tensor<f64>) -> TensorResult<()>;
    /// Result of the last successful forward pass.
    fn output(&self) -> &Tensor<f64>;
}
