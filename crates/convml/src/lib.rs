//! # convml
//!
//! A single-channel 2D convolution layer: cross-correlation with zero or no
//! padding, a scalar bias, and ReLU.
//!
//! ## Quick Start
//!
//! ```rust
//! use convml::prelude::*;
//!
//! let mut layer = ConvLayer::new(5, 3).unwrap();
//! let input = Tensor::from_fn(5, 5, |i, j| (i + j) as f64);
//! layer.feed_forward(&input).unwrap();
//! assert_eq!(layer.output().shape_vec(), vec![5, 5]);
//! ```

pub use convml_core as core;
pub use convml_nn as nn;
pub use convml_io as io;

/// Commonly used types.
pub mod prelude {
    pub use convml_core::{Shape, Tensor, TensorError, TensorResult};
    pub use convml_nn::{ConvConfig, ConvLayer, KernelInit, Layer, PaddingMode};
    pub use convml_io::{render_layer, write_layer, PrintOptions};
}
