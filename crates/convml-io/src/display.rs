use convml_core::{Float, Tensor};
use convml_nn::ConvLayer;
use std::fmt;
use std::io::{self, Write};

const RULE: &str = "------------------------------------------------------------------------------";

/// Formatting knobs for printing matrices and layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Digits after the decimal point.
    pub num_decimals: usize,
    /// Print the image column-major (the layer's image is stored row-major).
    pub transpose_image: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            num_decimals: 1,
            transpose_image: true,
        }
    }
}

fn fmt_matrix<T: Float>(
    f: &mut impl fmt::Write,
    m: &Tensor<T>,
    num_decimals: usize,
) -> fmt::Result {
    let cols = match m.shape().dims() {
        [_, c] => *c,
        _ => return Err(fmt::Error),
    };
    if cols == 0 {
        return Ok(());
    }
    for row in m.data().chunks(cols) {
        for v in row {
            write!(f, "{:.*} ", num_decimals, v)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

/// Write a 2-D matrix one row per line, each value followed by a space.
pub fn write_matrix<T: Float, W: Write>(
    w: &mut W,
    m: &Tensor<T>,
    num_decimals: usize,
) -> io::Result<()> {
    let mut s = String::new();
    fmt_matrix(&mut s, m, num_decimals)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "matrix must be 2-D"))?;
    w.write_all(s.as_bytes())
}

/// Human-readable dump of a layer: sizes, image, kernel, bias and feature map.
pub struct LayerReport<'a> {
    layer: &'a ConvLayer,
    opts: PrintOptions,
}

impl<'a> LayerReport<'a> {
    pub fn new(layer: &'a ConvLayer, opts: PrintOptions) -> Self {
        LayerReport { layer, opts }
    }
}

impl fmt::Display for LayerReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layer = self.layer;
        let d = self.opts.num_decimals;
        if layer.image().is_empty() {
            return Ok(());
        }

        writeln!(f, "{}", RULE)?;
        writeln!(f, "Image size: {}", layer.image().shape())?;
        writeln!(f, "Kernel size: {}", layer.kernel().shape())?;
        writeln!(f)?;

        writeln!(f, "Image:")?;
        if self.opts.transpose_image {
            let transposed = layer.image().t().map_err(|_| fmt::Error)?;
            fmt_matrix(f, &transposed, d)?;
        } else {
            fmt_matrix(f, layer.image(), d)?;
        }

        writeln!(f, "\nKernel:")?;
        fmt_matrix(f, layer.kernel(), d)?;

        writeln!(f, "\nKernel bias: {:.*}", d, layer.bias())?;

        writeln!(f, "\nFeature map:")?;
        fmt_matrix(f, layer.output(), d)?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)
    }
}

/// Render a layer report to a string.
pub fn render_layer(layer: &ConvLayer, opts: &PrintOptions) -> String {
    LayerReport::new(layer, *opts).to_string()
}

/// Write a layer report to any writer.
pub fn write_layer<W: Write>(w: &mut W, layer: &ConvLayer, opts: &PrintOptions) -> io::Result<()> {
    write!(w, "{}", LayerReport::new(layer, *opts))
}
