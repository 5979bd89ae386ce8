pub use anyhow::{bail, ensure, Context, Result};
pub use std::path::Path;
pub use tch::{vision, Device, Kind, Tensor};
