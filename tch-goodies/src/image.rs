use crate::common::*;

/// Load an image file as a `Uint8` tensor of shape `[3, height, width]` in RGB order.
///
/// Fails if the decoded image does not have exactly three channels.
pub fn load_rgb_image(path: impl AsRef<Path>) -> Result<Tensor> {
    let path = path.as_ref();
    let image = vision::image::load(path)
        .with_context(|| format!("failed to decode image file '{}'", path.display()))?;
    let (channels, height, width) = image
        .size3()
        .with_context(|| format!("image file '{}' is not a 2D image", path.display()))?;
    ensure!(
        channels == 3,
        "expect 3 channels in image file '{}', but get {}",
        path.display(),
        channels
    );
    ensure!(
        height > 0 && width > 0,
        "image file '{}' is empty",
        path.display()
    );
    Ok(image)
}
