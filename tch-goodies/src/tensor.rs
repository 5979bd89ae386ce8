use crate::common::*;

pub trait TensorExt {
    /// Resize the last two dimensions with bicubic interpolation.
    ///
    /// Accepts `[channels, height, width]` images. `Uint8` input is
    /// saturated back into `Uint8`, floating point input stays as is.
    fn f_resize2d_bicubic(&self, new_height: i64, new_width: i64) -> Result<Tensor>;

    fn resize2d_bicubic(&self, new_height: i64, new_width: i64) -> Tensor {
        self.f_resize2d_bicubic(new_height, new_width).unwrap()
    }

    /// Resize a `[height, width]` or `[channels, height, width]` map with
    /// nearest-neighbor interpolation, keeping the input kind.
    fn f_resize2d_nearest(&self, new_height: i64, new_width: i64) -> Result<Tensor>;

    fn resize2d_nearest(&self, new_height: i64, new_width: i64) -> Tensor {
        self.f_resize2d_nearest(new_height, new_width).unwrap()
    }

    /// Take a window from the last two dimensions.
    fn f_crop(&self, top: i64, left: i64, height: i64, width: i64) -> Result<Tensor>;

    fn crop(&self, top: i64, left: i64, height: i64, width: i64) -> Tensor {
        self.f_crop(top, left, height, width).unwrap()
    }

    /// Rotate the last two dimensions by `k` quarter turns counter-clockwise.
    fn f_rot90_2d(&self, k: i64) -> Result<Tensor>;

    fn rot90_2d(&self, k: i64) -> Tensor {
        self.f_rot90_2d(k).unwrap()
    }

    /// Convert a `[channels, height, width]` image in 0..=255 range to
    /// float and apply `(x / 255 - mean) / std` per channel.
    fn f_normalize_image(&self, mean: &[f64], std: &[f64]) -> Result<Tensor>;

    fn normalize_image(&self, mean: &[f64], std: &[f64]) -> Tensor {
        self.f_normalize_image(mean, std).unwrap()
    }

    /// Copy `src` into the top-left corner of the last two dimensions of
    /// this tensor. The storage of `self` is modified in place.
    fn f_paste_top_left_(&self, src: &Tensor) -> Result<()>;
}

impl TensorExt for Tensor {
    fn f_resize2d_bicubic(&self, new_height: i64, new_width: i64) -> Result<Tensor> {
        ensure!(
            new_height > 0 && new_width > 0,
            "target size must be positive, but get {}x{}",
            new_height,
            new_width
        );

        tch::no_grad(|| match (self.kind(), self.size().as_slice()) {
            (Kind::Uint8, &[_channels, _height, _width]) => {
                let resized = self
                    .to_kind(Kind::Float)
                    .unsqueeze(0)
                    .f_upsample_bicubic2d(
                        &[new_height, new_width],
                        false,
                        None::<f64>,
                        None::<f64>,
                    )?
                    .squeeze_dim(0)
                    .clamp(0.0, 255.0)
                    .round()
                    .to_kind(Kind::Uint8);
                Ok(resized)
            }
            (Kind::Float | Kind::Double, &[_channels, _height, _width]) => {
                let resized = self
                    .unsqueeze(0)
                    .f_upsample_bicubic2d(
                        &[new_height, new_width],
                        false,
                        None::<f64>,
                        None::<f64>,
                    )?
                    .squeeze_dim(0);
                Ok(resized)
            }
            (kind, &[_channels, _height, _width]) => bail!("unsupported data kind {:?}", kind),
            _ => bail!("invalid shape: expect three dimensions"),
        })
    }

    fn f_resize2d_nearest(&self, new_height: i64, new_width: i64) -> Result<Tensor> {
        ensure!(
            new_height > 0 && new_width > 0,
            "target size must be positive, but get {}x{}",
            new_height,
            new_width
        );
        let kind = self.kind();

        tch::no_grad(|| {
            let input = match self.dim() {
                2 => self.unsqueeze(0).unsqueeze(0),
                3 => self.unsqueeze(0),
                _ => bail!("invalid shape: expect two or three dimensions"),
            };
            let resized = input
                .to_kind(Kind::Float)
                .f_upsample_nearest2d(&[new_height, new_width], None::<f64>, None::<f64>)?
                .to_kind(kind);
            let resized = match self.dim() {
                2 => resized.squeeze_dim(0).squeeze_dim(0),
                _ => resized.squeeze_dim(0),
            };
            Ok(resized)
        })
    }

    fn f_crop(&self, top: i64, left: i64, height: i64, width: i64) -> Result<Tensor> {
        let size = self.size();
        let ndim = size.len();
        ensure!(ndim >= 2, "input tensor must have at least two dimensions");
        let (orig_h, orig_w) = (size[ndim - 2], size[ndim - 1]);
        ensure!(
            top >= 0 && left >= 0 && height > 0 && width > 0,
            "invalid crop window"
        );
        ensure!(
            top + height <= orig_h && left + width <= orig_w,
            "crop window {}x{} at ({}, {}) exceeds input size {}x{}",
            height,
            width,
            top,
            left,
            orig_h,
            orig_w
        );

        let cropped = self
            .f_narrow(ndim as i64 - 2, top, height)?
            .f_narrow(ndim as i64 - 1, left, width)?;
        Ok(cropped)
    }

    fn f_rot90_2d(&self, k: i64) -> Result<Tensor> {
        let ndim = self.dim() as i64;
        ensure!(ndim >= 2, "input tensor must have at least two dimensions");
        let rotated = self.f_rot90(k.rem_euclid(4), &[ndim - 2, ndim - 1])?;
        Ok(rotated)
    }

    fn f_normalize_image(&self, mean: &[f64], std: &[f64]) -> Result<Tensor> {
        let (channels, _height, _width) = self.size3()?;
        ensure!(
            mean.len() == channels as usize && std.len() == channels as usize,
            "expect {} mean and std values, but get {} and {}",
            channels,
            mean.len(),
            std.len()
        );
        ensure!(
            std.iter().all(|&value| value > 0.0),
            "std values must be positive"
        );

        tch::no_grad(|| {
            let mean = Tensor::of_slice(mean)
                .to_kind(Kind::Float)
                .view([channels, 1, 1])
                .to_device(self.device());
            let std = Tensor::of_slice(std)
                .to_kind(Kind::Float)
                .view([channels, 1, 1])
                .to_device(self.device());
            let normalized = (self.to_kind(Kind::Float) / 255.0 - mean) / std;
            Ok(normalized)
        })
    }

    fn f_paste_top_left_(&self, src: &Tensor) -> Result<()> {
        let dst_size = self.size();
        let src_size = src.size();
        let ndim = dst_size.len();
        ensure!(
            ndim >= 2 && ndim == src_size.len(),
            "source and destination must have identical number of dimensions"
        );
        ensure!(
            dst_size[..ndim - 2] == src_size[..ndim - 2],
            "leading dimensions do not match, {:?} vs {:?}",
            dst_size,
            src_size
        );
        let (src_h, src_w) = (src_size[ndim - 2], src_size[ndim - 1]);

        let mut window = self.f_crop(0, 0, src_h, src_w)?;
        tch::no_grad(|| window.f_copy_(src))?;
        Ok(())
    }
}
