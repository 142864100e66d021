pub mod layer;
pub mod padding;
pub mod init;
pub mod config;
pub mod conv;

pub use layer::*;
pub use padding::*;
pub use init::*;
pub use config::*;
pub use conv::*;
