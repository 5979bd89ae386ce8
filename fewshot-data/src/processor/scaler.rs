//! Resize and padding arithmetic.

use crate::common::*;

/// The resize factor that brings the shorter side to `short_target` while
/// keeping the longer side within `long_cap`.
pub fn scale_for(size: &HW<usize>, short_target: usize, long_cap: usize) -> f64 {
    let short_side = size.min_side() as f64;
    let long_side = size.max_side() as f64;
    (short_target as f64 / short_side).min(long_cap as f64 / long_side)
}

/// The smallest multiple of `k` that is not less than `value`.
pub fn round_up_to_multiple(value: usize, k: NonZeroUsize) -> usize {
    let k = k.get();
    (value + k - 1) / k * k
}

/// The intended per-sample resize, truncated to whole pixels.
pub fn resize_size(size: &HW<usize>, short_target: usize, long_cap: usize) -> HW<usize> {
    let scale = scale_for(size, short_target, long_cap);
    let h = (size.h() as f64 * scale) as usize;
    let w = (size.w() as f64 * scale) as usize;
    HW::from_hw([h, w])
}

/// The shared size of a batch.
///
/// Takes the component-wise maximum of every sample's intended resize and
/// rounds each dimension up to a multiple of `multiple`, so every sample
/// fits without cropping.
pub fn batch_resize_size<'a>(
    sizes: impl IntoIterator<Item = &'a HW<usize>>,
    short_target: usize,
    long_cap: usize,
    multiple: NonZeroUsize,
) -> Result<HW<usize>> {
    let max_size = sizes
        .into_iter()
        .map(|size| resize_size(size, short_target, long_cap))
        .reduce(|lhs, rhs| lhs.max_with(&rhs))
        .ok_or_else(|| format_err!("cannot compute the size of an empty batch"))?;
    let h = round_up_to_multiple(max_size.h(), multiple);
    let w = round_up_to_multiple(max_size.w(), multiple);
    ensure!(h > 0 && w > 0, "the batch size {}x{} is degenerated", h, w);
    Ok(HW::from_hw([h, w]))
}
