use convml_core::{Tensor, TensorError, TensorResult};
use log::{debug, trace};

use crate::config::ConvConfig;
use crate::init::KernelInit;
use crate::layer::Layer;
use crate::padding::PaddingMode;

/// Default bias added to every feature-map position.
pub const DEFAULT_BIAS: f64 = 0.1;

/// Single-channel 2D convolution layer with fused bias and ReLU.
///
/// Image:  [image_size, image_size]
/// Kernel: [kernel_size, kernel_size]
/// Output: [out, out] where out depends on the [`PaddingMode`]
///
/// The kernel is applied without flipping, so this computes a
/// cross-correlation:
///
/// `output[i][j] = max(0, Σ_k Σ_l padded[i + k][j + l] * kernel[k][l] + bias)`
///
/// Padding is never stored: `image` always holds the last accepted input and
/// out-of-bounds taps read zero.
#[derive(Debug, Clone)]
pub struct ConvLayer {
    image: Tensor<f64>,
    kernel: Tensor<f64>,
    bias: f64,
    padding: PaddingMode,
    output: Tensor<f64>,
}

impl ConvLayer {
    /// Create a layer with the `Scaled` kernel, bias 0.1 and `Same` padding.
    pub fn new(image_size: usize, kernel_size: usize) -> TensorResult<Self> {
        Self::from_config(&ConvConfig {
            image_size,
            kernel_size,
            ..ConvConfig::default()
        })
    }

    /// Create a layer whose kernel is `f(row, col)` at every position.
    pub fn with_initializer<F>(image_size: usize, kernel_size: usize, f: F) -> TensorResult<Self>
    where
        F: Fn(usize, usize) -> f64,
    {
        PaddingMode::Same.validate(image_size, kernel_size)?;
        let kernel = Tensor::from_fn(kernel_size, kernel_size, f);
        Ok(Self::assemble(image_size, kernel, DEFAULT_BIAS, PaddingMode::Same))
    }

    /// Create a layer from an explicit square kernel.
    pub fn with_kernel(image_size: usize, kernel: Tensor<f64>, bias: f64) -> TensorResult<Self> {
        let kernel_size = kernel.square_side().ok_or_else(|| {
            TensorError::InvalidDimension(format!("kernel must be square, got {}", kernel.shape()))
        })?;
        PaddingMode::Same.validate(image_size, kernel_size)?;
        Ok(Self::assemble(image_size, kernel, bias, PaddingMode::Same))
    }

    pub fn from_config(config: &ConvConfig) -> TensorResult<Self> {
        config.padding.validate(config.image_size, config.kernel_size)?;
        let kernel = config.init.build(config.kernel_size)?;
        Ok(Self::assemble(config.image_size, kernel, config.bias, config.padding))
    }

    /// Replace the bias. A feature map from an earlier pass is recomputed.
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self.refresh_output();
        self
    }

    /// Switch the padding mode, re-checking the size contract.
    /// A feature map from an earlier pass is recomputed.
    pub fn with_padding(mut self, padding: PaddingMode) -> TensorResult<Self> {
        padding.validate(self.image_size(), self.kernel_size())?;
        self.padding = padding;
        self.refresh_output();
        Ok(self)
    }

    /// Keep the output in step with bias and padding once a pass has run.
    fn refresh_output(&mut self) {
        if !self.output.is_empty() {
            self.output = self.convolve();
        }
    }

    fn assemble(image_size: usize, kernel: Tensor<f64>, bias: f64, padding: PaddingMode) -> Self {
        debug!(
            "conv layer: image {}x{}, kernel {}, bias {}, padding {:?}",
            image_size,
            image_size,
            kernel.shape(),
            bias,
            padding
        );
        ConvLayer {
            image: Tensor::zeros(vec![image_size, image_size]),
            kernel,
            bias,
            padding,
            output: Tensor::empty(),
        }
    }

    // ─── Forward ────────────────────────────────────────────────────────────

    /// Copy `input` into the image and recompute the feature map.
    ///
    /// On `DimensionMismatch` neither the image nor the output is touched.
    pub fn feed_forward(&mut self, input: &Tensor<f64>) -> TensorResult<()> {
        if input.shape() != self.image.shape() {
            debug!(
                "conv layer rejected input of shape {}, expected {}",
                input.shape(),
                self.image.shape()
            );
            return Err(TensorError::DimensionMismatch {
                expected: self.image.shape_vec(),
                got: input.shape_vec(),
            });
        }

        self.image.data_mut().copy_from_slice(input.data());
        self.output = self.convolve();
        trace!("conv layer produced feature map {}", self.output.shape());
        Ok(())
    }

    /// Same as [`feed_forward`](Self::feed_forward) for nested row vectors.
    pub fn feed_forward_rows(&mut self, rows: &[Vec<f64>]) -> TensorResult<()> {
        let input = Tensor::from_vec2d(rows).map_err(|_| TensorError::DimensionMismatch {
            expected: self.image.shape_vec(),
            got: vec![rows.len(), rows.first().map_or(0, Vec::len)],
        })?;
        self.feed_forward(&input)
    }

    fn convolve(&self) -> Tensor<f64> {
        let n = self.image_size();
        let k = self.kernel_size();
        let pad = self.padding.amount(k) as isize;
        let out = self.padding.output_size(n, k);
        let image = self.image.data();
        let kernel = self.kernel.data();

        Tensor::from_fn(out, out, |i, j| {
            let mut sum = 0.0;
            for kh in 0..k {
                let ih = (i + kh) as isize - pad;
                if ih < 0 || ih >= n as isize {
                    continue;
                }
                for kw in 0..k {
                    let iw = (j + kw) as isize - pad;
                    if iw >= 0 && iw < n as isize {
                        sum += image[ih as usize * n + iw as usize] * kernel[kh * k + kw];
                    }
                }
            }
            (sum + self.bias).max(0.0)
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    /// Last accepted input, without padding.
    pub fn image(&self) -> &Tensor<f64> {
        &self.image
    }

    pub fn kernel(&self) -> &Tensor<f64> {
        &self.kernel
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Feature map of the last successful pass; `0 × 0` before the first one.
    pub fn output(&self) -> &Tensor<f64> {
        &self.output
    }

    pub fn padding(&self) -> PaddingMode {
        self.padding
    }

    pub fn image_size(&self) -> usize {
        self.image.shape().dims()[0]
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel.shape().dims()[0]
    }

    /// Side of the feature map each pass produces.
    pub fn output_size(&self) -> usize {
        self.padding.output_size(self.image_size(), self.kernel_size())
    }
}

impl Layer for ConvLayer {
    fn feed_forward(&mut self, input: &Tensor<f64>) -> TensorResult<()> {
        ConvLayer::feed_forward(self, input)
    }

    fn output(&self) -> &Tensor<f64> {
        ConvLayer::output(self)
    }
}

impl Default for ConvLayer {
    fn default() -> Self {
        let config = ConvConfig::default();
        let kernel = Tensor::from_fn(config.kernel_size, config.kernel_size, crate::init::scaled);
        Self::assemble(config.image_size, kernel, config.bias, config.padding)
    }
}

impl From<&ConvLayer> for ConvConfig {
    fn from(layer: &ConvLayer) -> Self {
        ConvConfig {
            image_size: layer.image_size(),
            kernel_size: layer.kernel_size(),
            bias: layer.bias,
            padding: layer.padding,
            init: KernelInit::Explicit(layer.kernel.to_vec2d().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_input() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 1.0, 2.0, 4.0, 5.0],
            vec![6.0, 7.0, 8.0, 9.0, 10.0],
            vec![-1.0, 0.0, 5.0, 2.0, 6.0],
            vec![10.0, 15.0, 2.0, 6.0, 8.0],
            vec![34.0, 3.0, 2.0, 5.6, 7.0],
        ]
    }

    fn sample_kernel() -> Tensor<f64> {
        Tensor::from_vec2d(&[
            vec![0.4, 0.6, 0.7],
            vec![0.5, 0.6, 0.5],
            vec![0.6, 0.2, 0.4],
        ])
        .unwrap()
    }

    fn sample_layer() -> ConvLayer {
        ConvLayer::with_kernel(5, sample_kernel(), 0.1).unwrap()
    }

    fn ramp(n: usize) -> Tensor<f64> {
        Tensor::from_fn(n, n, |i, j| (i * n + j) as f64 - 3.0)
    }

    #[test]
    fn test_construction() {
        let layer = ConvLayer::new(5, 3).unwrap();
        assert_eq!(layer.image().shape_vec(), vec![5, 5]);
        assert!(layer.image().data().iter().all(|&x| x == 0.0));
        assert_eq!(layer.kernel().shape_vec(), vec![3, 3]);
        assert_abs_diff_eq!(layer.kernel().get(&[2, 1]).unwrap(), 0.6);
        assert_abs_diff_eq!(layer.bias(), 0.1);
        assert_eq!(layer.padding(), PaddingMode::Same);
        assert!(layer.output().is_empty());
    }

    #[test]
    fn test_construction_rejects_zero_sizes() {
        assert!(matches!(ConvLayer::new(0, 3), Err(TensorError::InvalidDimension(_))));
        assert!(matches!(ConvLayer::new(5, 0), Err(TensorError::InvalidDimension(_))));
        assert!(ConvLayer::with_initializer(0, 1, |_, _| 1.0).is_err());
        assert!(ConvLayer::with_kernel(5, Tensor::empty(), 0.0).is_err());
        assert!(ConvLayer::with_kernel(5, Tensor::zeros(vec![3, 2]), 0.0).is_err());
    }

    #[test]
    fn test_scenario_same_padding() {
        let mut layer = sample_layer();
        layer.feed_forward_rows(&sample_input()).unwrap();
        let out = layer.output();
        assert_eq!(out.shape_vec(), vec![5, 5]);
        assert!(out.data().iter().all(|&x| x >= 0.0));

        // 7*.4 + 8*.6 + 9*.7 + 0*.5 + 5*.6 + 2*.5 + 15*.6 + 2*.2 + 6*.4 + 0.1
        assert_abs_diff_eq!(out.get(&[2, 2]).unwrap(), 29.8, epsilon = 1e-9);
        // Corner only sees the lower-right 2x2 of the kernel.
        assert_abs_diff_eq!(out.get(&[0, 0]).unwrap(), 4.6, epsilon = 1e-9);
        assert_abs_diff_eq!(out.get(&[1, 1]).unwrap(), 14.7, epsilon = 1e-9);
    }

    #[test]
    fn test_scenario_valid_padding() {
        let mut layer = sample_layer().with_padding(PaddingMode::Valid).unwrap();
        assert_eq!(layer.output_size(), 3);
        layer.feed_forward_rows(&sample_input()).unwrap();
        let out = layer.output();
        assert_eq!(out.shape_vec(), vec![3, 3]);
        assert_abs_diff_eq!(out.get(&[0, 0]).unwrap(), 14.7, epsilon = 1e-9);
        assert_abs_diff_eq!(out.get(&[1, 1]).unwrap(), 29.8, epsilon = 1e-9);
        // Image keeps the raw input.
        assert_eq!(layer.image().shape_vec(), vec![5, 5]);
    }

    #[test]
    fn test_valid_rejects_large_kernel() {
        let layer = ConvLayer::new(2, 3).unwrap();
        assert!(matches!(
            layer.with_padding(PaddingMode::Valid),
            Err(TensorError::InvalidDimension(_))
        ));
        let config = ConvConfig {
            image_size: 2,
            kernel_size: 3,
            padding: PaddingMode::Valid,
            ..ConvConfig::default()
        };
        assert!(ConvLayer::from_config(&config).is_err());
    }

    #[test]
    fn test_shape_contract_same() {
        for n in 1..7 {
            for k in 1..6 {
                let mut layer = ConvLayer::new(n, k).unwrap();
                layer.feed_forward(&ramp(n)).unwrap();
                assert_eq!(layer.output().shape_vec(), vec![n, n]);
                assert_eq!(layer.output_size(), n);
            }
        }
    }

    #[test]
    fn test_rejection_leaves_state_intact() {
        let mut layer = sample_layer();
        layer.feed_forward_rows(&sample_input()).unwrap();
        let image = layer.image().clone();
        let output = layer.output().clone();

        let err = layer.feed_forward(&ramp(4)).unwrap_err();
        assert_eq!(
            err,
            TensorError::DimensionMismatch { expected: vec![5, 5], got: vec![4, 4] }
        );
        assert!(layer.feed_forward(&Tensor::zeros(vec![5, 4])).is_err());
        assert!(layer.feed_forward(&Tensor::zeros(vec![25])).is_err());
        let ragged = [vec![1.0; 5], vec![1.0; 4], vec![1.0; 5], vec![1.0; 5], vec![1.0; 5]];
        assert!(layer.feed_forward_rows(&ragged).is_err());

        assert_eq!(layer.image(), &image);
        assert_eq!(layer.output(), &output);

        // Still usable.
        layer.feed_forward(&ramp(5)).unwrap();
    }

    #[test]
    fn test_non_negative_output() {
        let checker = |r: usize, c: usize| if (r + c) % 2 == 0 { -1.0 } else { 0.5 };
        let mut layer = ConvLayer::with_initializer(6, 3, checker).unwrap().with_bias(-0.3);
        layer.feed_forward(&ramp(6)).unwrap();
        assert!(layer.output().data().iter().all(|&x| x >= 0.0));

        let mut negative = ConvLayer::with_initializer(4, 3, |_, _| -1.0).unwrap();
        negative.feed_forward(&Tensor::full(vec![4, 4], 2.0)).unwrap();
        assert!(negative.output().data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_idempotent() {
        let mut layer = sample_layer();
        let input = Tensor::from_vec2d(&sample_input()).unwrap();
        layer.feed_forward(&input).unwrap();
        let first = layer.output().clone();
        layer.feed_forward(&input).unwrap();
        let second = layer.output();
        assert!(first
            .data()
            .iter()
            .zip(second.data())
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_zero_kernel_zero_bias() {
        let mut layer = ConvLayer::with_initializer(5, 3, |_, _| 0.0).unwrap().with_bias(0.0);
        let images = [
            Tensor::from_vec2d(&sample_input()).unwrap(),
            ramp(5),
            Tensor::full(vec![5, 5], -1e9),
            Tensor::full(vec![5, 5], 1e12),
            Tensor::from_fn(5, 5, |i, j| if (i + j) % 2 == 0 { -250.5 } else { 3e7 }),
        ];
        for image in &images {
            layer.feed_forward(image).unwrap();
            assert!(layer.output().data().iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_nan_input_clamps_to_zero() {
        let mut layer = sample_layer();
        layer.feed_forward(&Tensor::full(vec![5, 5], f64::NAN)).unwrap();
        assert_eq!(layer.output().shape_vec(), vec![5, 5]);
        assert!(layer.output().data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_infinite_input_propagates() {
        let mut layer = sample_layer();
        layer.feed_forward(&Tensor::full(vec![5, 5], f64::INFINITY)).unwrap();
        assert!(layer.output().data().iter().all(|&x| x == f64::INFINITY));

        layer.feed_forward(&Tensor::full(vec![5, 5], f64::NEG_INFINITY)).unwrap();
        assert!(layer.output().data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_setters_after_pass_refresh_output() {
        let input = Tensor::full(vec![5, 5], 1.0);
        let mut layer = ConvLayer::with_initializer(5, 3, |_, _| 1.0).unwrap();
        layer.feed_forward(&input).unwrap();
        assert_abs_diff_eq!(layer.output().get(&[0, 0]).unwrap(), 4.1, epsilon = 1e-12);

        let layer = layer.with_bias(-100.0);
        assert!(layer.output().data().iter().all(|&x| x == 0.0));

        let layer = layer.with_bias(0.5).with_padding(PaddingMode::Valid).unwrap();
        assert_eq!(layer.output().shape_vec(), vec![3, 3]);
        assert_eq!(layer.output_size(), 3);
        assert!(layer.output().data().iter().all(|&x| (x - 9.5).abs() < 1e-12));

        let mut fresh = ConvLayer::with_initializer(5, 3, |_, _| 1.0)
            .unwrap()
            .with_bias(0.5)
            .with_padding(PaddingMode::Valid)
            .unwrap();
        fresh.feed_forward(&input).unwrap();
        assert_eq!(layer.output(), fresh.output());
    }

    #[test]
    fn test_setters_before_pass_keep_output_empty() {
        let layer = ConvLayer::new(5, 3)
            .unwrap()
            .with_bias(2.0)
            .with_padding(PaddingMode::Valid)
            .unwrap();
        assert!(layer.output().is_empty());
    }

    #[test]
    fn test_even_kernel() {
        // padding = floor(2 / 2) = 1, so each window covers the top-left 2x2 neighbourhood.
        let mut layer = ConvLayer::with_initializer(3, 2, |_, _| 1.0).unwrap().with_bias(0.0);
        let input = Tensor::from_fn(3, 3, |i, j| (i * 3 + j + 1) as f64);
        layer.feed_forward(&input).unwrap();
        let out = layer.output();
        assert_eq!(out.shape_vec(), vec![3, 3]);
        assert_abs_diff_eq!(out.get(&[0, 0]).unwrap(), 1.0);
        assert_abs_diff_eq!(out.get(&[0, 2]).unwrap(), 5.0);
        assert_abs_diff_eq!(out.get(&[1, 1]).unwrap(), 12.0);
        assert_abs_diff_eq!(out.get(&[2, 2]).unwrap(), 28.0);
    }

    #[test]
    fn test_kernel_larger_than_image() {
        let mut layer = ConvLayer::with_initializer(2, 5, |_, _| 1.0).unwrap().with_bias(0.0);
        layer.feed_forward_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(layer.output().data(), &[10.0; 4]);
    }

    #[test]
    fn test_no_kernel_flip() {
        // Only the top-left weight is set: output[i][j] picks image[i-1][j-1].
        let mut layer =
            ConvLayer::with_initializer(3, 3, |r, c| if r == 0 && c == 0 { 1.0 } else { 0.0 })
                .unwrap()
                .with_bias(0.0);
        let input = Tensor::from_fn(3, 3, |i, j| (i * 3 + j + 1) as f64);
        layer.feed_forward(&input).unwrap();
        assert_eq!(layer.output().data(), &[0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 4.0, 5.0]);
    }

    #[test]
    fn test_output_resized_each_pass() {
        let mut layer = ConvLayer::new(4, 3).unwrap();
        assert_eq!(layer.output().shape_vec(), vec![0, 0]);
        layer.feed_forward(&ramp(4)).unwrap();
        assert_eq!(layer.output().shape_vec(), vec![4, 4]);
    }

    #[test]
    fn test_layer_trait() {
        let mut layer: Box<dyn Layer> = Box::new(ConvLayer::new(3, 3).unwrap());
        layer.feed_forward(&ramp(3)).unwrap();
        assert_eq!(layer.output().shape_vec(), vec![3, 3]);
    }

    #[test]
    fn test_config_round_trip() {
        let layer = sample_layer().with_padding(PaddingMode::Valid).unwrap();
        let config = ConvConfig::from(&layer);
        let rebuilt = ConvLayer::from_config(&config).unwrap();
        assert_eq!(rebuilt.kernel(), layer.kernel());
        assert_eq!(rebuilt.padding(), PaddingMode::Valid);
        assert_abs_diff_eq!(rebuilt.bias(), 0.1);
    }

    #[test]
    fn test_default_matches_new() {
        let a = ConvLayer::default();
        let b = ConvLayer::new(5, 3).unwrap();
        assert_eq!(a.kernel(), b.kernel());
        assert_eq!(a.image(), b.image());
    }

    #[test]
    fn test_instances_are_independent_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConvLayer>();

        let handles: Vec<_> = (1..4)
            .map(|n| {
                std::thread::spawn(move || {
                    let mut layer = ConvLayer::new(n + 2, 3).unwrap();
                    layer.feed_forward(&ramp(n + 2)).unwrap();
                    layer.output().shape_vec()
                })
            })
            .collect();
        for (n, h) in (1..4).zip(handles) {
            assert_eq!(h.join().unwrap(), vec![n + 2, n + 2]);
        }
    }
}
