//! Data preprocessing building blocks.

pub mod assembler;
pub mod image_loader;
pub mod scaler;

pub use assembler::*;
pub use image_loader::*;
pub use scaler::*;
