use ndarray::{ArrayView3, Axis};

use super::resample::resize_bilinear;

/// Downsamples a patch to `size × size` and flattens it channel by
/// channel, each channel in raster order.
pub fn bin_spatial(patch: ArrayView3<f32>, size: usize) -> Vec<f32> {
    let resized = resize_bilinear(patch, size, size);
    let mut out = Vec::with_capacity(resized.len());
    for channel in resized.axis_iter(Axis(2)) {
        out.extend(channel.iter().copied());
    }
    out
}

/// Per-channel value histograms, concatenated in channel order.
///
/// Bins are equal-width over `[lo, hi]`; a value equal to `hi` lands in
/// the last bin, anything outside the range (or NaN) is dropped.
pub fn color_hist(patch: ArrayView3<f32>, bins: usize, range: (f32, f32)) -> Vec<f32> {
    let (lo, hi) = range;
    let channels = patch.dim().2;
    let mut out = vec![0.0f32; bins * channels];
    if bins == 0 || hi <= lo {
        return out;
    }

    let width = (hi - lo) / bins as f32;
    for (c, channel) in patch.axis_iter(Axis(2)).enumerate() {
        let hist = &mut out[c * bins..(c + 1) * bins];
        for &v in channel.iter() {
            if !(lo..=hi).contains(&v) {
                continue;
            }
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            hist[bin] += 1.0;
        }
    }
    out
}
