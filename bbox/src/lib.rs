//! Geometry value types for image sizes and box annotations.

mod common;

pub use hw::*;
pub mod hw;

pub use anchor::*;
pub mod anchor;
