//! The rotation prediction pretext task.

use crate::{common::*, dataset::SampleRecord, processor::ImageLoader};

/// The side length of the square crop.
pub const ROTATION_CROP_SIZE: i64 = 600;
/// Images whose shorter side is at most this value are enlarged first.
pub const UPSCALE_THRESHOLD: usize = 850;
/// The approximate shorter side after enlargement.
pub const UPSCALE_TARGET: f64 = 650.0;

#[derive(Debug, Clone)]
pub struct RotationTask {
    loader: ImageLoader,
}

impl RotationTask {
    pub fn new(loader: ImageLoader) -> Self {
        Self { loader }
    }

    /// Produce `[batch, 3, 600, 600]` rotated crops and the `[batch]`
    /// number of quarter turns.
    pub fn generate(
        &self,
        records: &[Arc<SampleRecord>],
        rng: &mut StdRng,
    ) -> Result<(Tensor, Tensor)> {
        let batch_size = records.len() as i64;
        let crops = Tensor::zeros(
            &[batch_size, 3, ROTATION_CROP_SIZE, ROTATION_CROP_SIZE],
            (Kind::Float, Device::Cpu),
        );

        let labels: Vec<i64> = records
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<_> {
                let image = self.loader.load(&record.fpath_img)?;
                let (_channels, height, width) = image.size3()?;
                let image = match upscaled_size(&HW::from_hw([height as usize, width as usize])) {
                    Some(size) => {
                        let [h, w] = size.hw();
                        image.f_resize2d_bicubic(h as i64, w as i64)?
                    }
                    None => image,
                };
                let image = self.loader.normalize(&image)?;

                let crop = random_crop(&image, ROTATION_CROP_SIZE, rng)?;
                let quarter_turns = rng.gen_range(0..4);
                let rotated = crop.f_rot90_2d(quarter_turns)?;

                tch::no_grad(|| crops.select(0, index as i64).f_copy_(&rotated))?;
                Ok(quarter_turns)
            })
            .try_collect()?;

        Ok((crops, Tensor::of_slice(&labels)))
    }
}

/// The enlarged size of an image with a short side of at most 850 pixels,
/// or `None` if the image is large enough.
pub fn upscaled_size(size: &HW<usize>) -> Option<HW<usize>> {
    let short_side = size.min_side();
    if short_side > UPSCALE_THRESHOLD {
        return None;
    }
    let scale = UPSCALE_TARGET / short_side as f64;
    let h = (size.h() as f64 * scale + 1.0) as usize;
    let w = (size.w() as f64 * scale + 1.0) as usize;
    Some(HW::from_hw([h, w]))
}

/// Take a `side` x `side` window at a uniformly random position.
pub fn random_crop(image: &Tensor, side: i64, rng: &mut StdRng) -> Result<Tensor> {
    let (_channels, height, width) = image.size3()?;
    ensure!(
        height >= side && width >= side,
        "image of size {}x{} is smaller than the {}x{} crop",
        height,
        width,
        side,
        side
    );
    let top = rng.gen_range(0..=(height - side));
    let left = rng.gen_range(0..=(width - side));
    image.f_crop(top, left, side, side)
}
