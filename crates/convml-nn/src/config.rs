use serde::{Deserialize, Serialize};

use crate::init::KernelInit;
use crate::padding::PaddingMode;

/// Construction parameters for a [`ConvLayer`](crate::ConvLayer).
///
/// Missing fields fall back to [`ConvConfig::default`] when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvConfig {
    pub image_size: usize,
    pub kernel_size: usize,
    pub bias: f64,
    pub padding: PaddingMode,
    pub init: KernelInit,
}

impl Default for ConvConfig {
    fn default() -> Self {
        ConvConfig {
            image_size: 5,
            kernel_size: 3,
            bias: 0.1,
            padding: PaddingMode::Same,
            init: KernelInit::Scaled,
        }
    }
}
