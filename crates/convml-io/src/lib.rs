pub mod display;
pub mod model_io;

pub use display::*;
pub use model_io::*;
