//! Image file loading and normalization.

use crate::{common::*, config::NormalizeConfig};

/// Loads images relative to a dataset root.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    root_dataset: PathBuf,
    mean: [f64; 3],
    std: [f64; 3],
}

impl ImageLoader {
    pub fn new(root_dataset: impl AsRef<Path>, normalize: &NormalizeConfig) -> Result<Self> {
        normalize.validate()?;
        Ok(Self {
            root_dataset: root_dataset.as_ref().to_owned(),
            mean: normalize.mean(),
            std: normalize.std(),
        })
    }

    pub fn root_dataset(&self) -> &Path {
        &self.root_dataset
    }

    /// Load the raw `Uint8` RGB image of shape `[3, height, width]`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Tensor> {
        load_rgb_image(self.root_dataset.join(path))
    }

    /// Load an image, resize it to exactly `size` with bicubic
    /// interpolation and normalize it.
    pub fn load_resized(&self, path: impl AsRef<Path>, size: &HW<usize>) -> Result<Tensor> {
        let image = self.load(path)?;
        let [h, w] = size.hw();
        let resized = image.f_resize2d_bicubic(h as i64, w as i64)?;
        self.normalize(&resized)
    }

    /// Convert a `Uint8` image into a normalized `Float` image.
    pub fn normalize(&self, image: &Tensor) -> Result<Tensor> {
        image.f_normalize_image(&self.mean, &self.std)
    }
}
