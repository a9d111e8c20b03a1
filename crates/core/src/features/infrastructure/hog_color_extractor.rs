use ndarray::{Array3, ArrayView3};

use super::color_features::{bin_spatial, color_hist};
use super::hog::GradientGrid;
use super::resample::resize_bilinear;
use crate::features::domain::color_space::to_feature_space;
use crate::features::domain::feature_params::{FeatureError, FeatureParams};

/// Spatial + color-histogram + gradient descriptor.
///
/// The same extractor serves the whole-region path used by the window
/// scanner (`gradient_grid` then `color_features` per window) and the
/// single-patch path used for training data (`extract`). Both produce the
/// same length and layout; gradients differ only along the window border,
/// where the patch path has no neighbouring pixels.
#[derive(Clone, Debug)]
pub struct HogColorExtractor {
    params: FeatureParams,
    hog_channels: Vec<usize>,
}

impl HogColorExtractor {
    pub fn new(params: FeatureParams) -> Result<Self, FeatureError> {
        params.validate()?;
        let hog_channels = params.hog_channel.indices();
        Ok(Self {
            params,
            hog_channels,
        })
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    pub fn feature_len(&self) -> usize {
        self.params.feature_len()
    }

    /// RGB bytes to the configured color space, as `[0, 1]` floats.
    pub fn to_feature_space(&self, rgb: ArrayView3<u8>) -> Array3<f32> {
        to_feature_space(rgb, self.params.color_space)
    }

    /// Gradient histograms for a whole (already converted) image.
    pub fn gradient_grid(&self, image: ArrayView3<f32>) -> GradientGrid {
        GradientGrid::compute(
            image,
            &self.hog_channels,
            self.params.orientations,
            self.params.pixels_per_cell,
            self.params.cells_per_block,
            self.params.blocks_per_window(),
        )
    }

    /// Appends the spatial bins then the color histogram of `patch`,
    /// resampling it to the window size first if needed.
    pub fn color_features(&self, patch: ArrayView3<f32>, out: &mut Vec<f32>) {
        let side = self.params.window_size();
        let (h, w, _) = patch.dim();
        if h == side && w == side {
            self.push_color_features(patch, out);
        } else {
            let resized = resize_bilinear(patch, side, side);
            self.push_color_features(resized.view(), out);
        }
    }

    fn push_color_features(&self, patch: ArrayView3<f32>, out: &mut Vec<f32>) {
        out.extend(bin_spatial(patch, self.params.spatial_size));
        out.extend(color_hist(
            patch,
            self.params.hist_bins,
            self.params.hist_range,
        ));
    }

    /// Full descriptor of one converted patch of any size.
    pub fn extract(&self, patch: ArrayView3<f32>) -> Result<Vec<f32>, FeatureError> {
        let (h, w, c) = patch.dim();
        if c != 3 {
            return Err(FeatureError::Channels(c));
        }
        if h == 0 || w == 0 {
            return Err(FeatureError::PatchTooSmall {
                width: w,
                height: h,
                minimum: 1,
            });
        }

        let side = self.params.window_size();
        let window = resize_bilinear(patch, side, side);

        let mut out = Vec::with_capacity(self.feature_len());
        self.push_color_features(window.view(), &mut out);
        let grid = self.gradient_grid(window.view());
        grid.window_features(0, 0, &mut out);
        Ok(out)
    }

    /// Converts an RGB byte patch and extracts its descriptor.
    pub fn extract_rgb(&self, rgb: ArrayView3<u8>) -> Result<Vec<f32>, FeatureError> {
        let c = rgb.dim().2;
        if c != 3 {
            return Err(FeatureError::Channels(c));
        }
        self.extract(self.to_feature_space(rgb).view())
    }
}
