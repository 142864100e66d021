use convml_core::{Tensor, TensorResult};
use convml_nn::{ConvConfig, ConvLayer, PaddingMode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;

/// Serializable snapshot of a layer's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    pub image_size: usize,
    pub kernel_size: usize,
    pub kernel: Vec<f64>, // row-major, kernel_size * kernel_size
    pub bias: f64,
    pub padding: PaddingMode,
}

impl LayerWeights {
    pub fn from_layer(layer: &ConvLayer) -> Self {
        LayerWeights {
            image_size: layer.image_size(),
            kernel_size: layer.kernel_size(),
            kernel: layer.kernel().data().to_vec(),
            bias: layer.bias(),
            padding: layer.padding(),
        }
    }

    /// Rebuild a layer, validating sizes the same way construction does.
    pub fn into_layer(self) -> TensorResult<ConvLayer> {
        let kernel = Tensor::new(self.kernel, vec![self.kernel_size, self.kernel_size])?;
        ConvLayer::with_kernel(self.image_size, kernel, self.bias)?.with_padding(self.padding)
    }
}

/// Save layer weights to a JSON file.
pub fn save_weights(weights: &LayerWeights, path: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(weights)?;
    fs::write(Path::new(path), json)?;
    Ok(())
}

/// Load layer weights from a JSON file.
pub fn load_weights(path: &str) -> Result<LayerWeights, Box<dyn Error>> {
    let json = fs::read_to_string(Path::new(path))?;
    let weights: LayerWeights = serde_json::from_str(&json)?;
    Ok(weights)
}

/// Save a layer configuration to a JSON file.
pub fn save_config(config: &ConvConfig, path: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(Path::new(path), json)?;
    Ok(())
}

/// Load a layer configuration from a JSON file. Absent fields take defaults.
pub fn load_config(path: &str) -> Result<ConvConfig, Box<dyn Error>> {
    let json = fs::read_to_string(Path::new(path))?;
    let config: ConvConfig = serde_json::from_str(&json)?;
    Ok(config)
}
