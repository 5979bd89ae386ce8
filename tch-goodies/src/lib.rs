mod common;
pub mod image;
pub mod tensor;

pub use image::*;
pub use tensor::*;
