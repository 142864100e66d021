use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{stdout, Write};

use convml_core::Tensor;
use convml_io::{load_config, write_layer, PrintOptions};
use convml_nn::{ConvConfig, ConvLayer, KernelInit};

fn demo_input() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 1.0, 2.0, 4.0, 5.0],
        vec![6.0, 7.0, 8.0, 9.0, 10.0],
        vec![-1.0, 0.0, 5.0, 2.0, 6.0],
        vec![10.0, 15.0, 2.0, 6.0, 8.0],
        vec![34.0, 3.0, 2.0, 5.6, 7.0],
    ]
}

fn demo_config() -> ConvConfig {
    ConvConfig {
        init: KernelInit::Explicit(vec![
            vec![0.4, 0.6, 0.7],
            vec![0.5, 0.6, 0.5],
            vec![0.6, 0.2, 0.4],
        ]),
        ..ConvConfig::default()
    }
}

/// Input for a config-driven run: a ramp centred on zero so ReLU has work to do.
fn ramp_input(n: usize) -> Tensor<f64> {
    let half = (n * n) as f64 / 2.0;
    Tensor::from_fn(n, n, |i, j| (i * n + j) as f64 - half)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = stdout();

    let (title, mut layer, input) = match std::env::args().nth(1) {
        Some(path) => {
            let config = load_config(&path)?;
            let input = ramp_input(config.image_size);
            (format!("Layer from {}", path), ConvLayer::from_config(&config)?, input)
        }
        None => {
            let config = demo_config();
            let input = Tensor::from_vec2d(&demo_input())?;
            let title = "Demo layer (5x5 image, 3x3 kernel)".to_string();
            (title, ConvLayer::from_config(&config)?, input)
        }
    };

    layer.feed_forward(&input)?;

    execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(format!("{}\n", title)),
        ResetColor,
    )?;
    write_layer(&mut stdout, &layer, &PrintOptions::default())?;
    stdout.flush()?;
    Ok(())
}
