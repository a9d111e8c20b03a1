use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::color_space::ColorSpace;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("invalid feature parameters: {0}")]
    InvalidParams(String),
    #[error("patch of {width}x{height} is too small, need at least {minimum}x{minimum}")]
    PatchTooSmall {
        width: usize,
        height: usize,
        minimum: usize,
    },
    #[error("expected a 3-channel patch, got {0} channels")]
    Channels(usize),
}

/// Which color channels contribute gradient histograms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HogChannel {
    #[default]
    All,
    Single(usize),
}

impl HogChannel {
    pub fn indices(self) -> Vec<usize> {
        match self {
            HogChannel::All => vec![0, 1, 2],
            HogChannel::Single(c) => vec![c],
        }
    }
}

/// Feature-extraction configuration shared by training and inference.
///
/// A descriptor is only meaningful for the classifier that was trained
/// with the exact same parameters, so these travel inside the model
/// artifact rather than the runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    pub color_space: ColorSpace,
    pub orientations: usize,
    pub pixels_per_cell: usize,
    pub cells_per_block: usize,
    pub hog_channel: HogChannel,
    pub spatial_size: usize,
    pub hist_bins: usize,
    pub hist_range: (f32, f32),
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Yuv,
            orientations: 8,
            pixels_per_cell: 8,
            cells_per_block: 2,
            hog_channel: HogChannel::All,
            spatial_size: 32,
            hist_bins: 32,
            hist_range: (0.0, 1.0),
        }
    }
}

impl FeatureParams {
    /// Side of the square classifier window in pixels (`cell_size²`).
    pub fn window_size(&self) -> usize {
        self.pixels_per_cell * self.pixels_per_cell
    }

    pub fn cells_per_window(&self) -> usize {
        self.window_size() / self.pixels_per_cell
    }

    pub fn blocks_per_window(&self) -> usize {
        (self.cells_per_window() + 1).saturating_sub(self.cells_per_block)
    }

    /// Values per normalized block: `cells_per_block² × orientations`.
    pub fn block_len(&self) -> usize {
        self.cells_per_block * self.cells_per_block * self.orientations
    }

    pub fn spatial_len(&self) -> usize {
        self.spatial_size * self.spatial_size * 3
    }

    pub fn hist_len(&self) -> usize {
        self.hist_bins * 3
    }

    pub fn hog_len(&self) -> usize {
        let bpw = self.blocks_per_window();
        self.hog_channel.indices().len() * bpw * bpw * self.block_len()
    }

    /// Length of the concatenated (spatial, histogram, gradient) vector.
    pub fn feature_len(&self) -> usize {
        self.spatial_len() + self.hist_len() + self.hog_len()
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        let invalid = |msg: String| Err(FeatureError::InvalidParams(msg));

        if self.orientations == 0 {
            return invalid("orientations must be > 0".into());
        }
        if self.pixels_per_cell < 2 {
            return invalid(format!(
                "pixels_per_cell must be >= 2, got {}",
                self.pixels_per_cell
            ));
        }
        if self.cells_per_block == 0 || self.cells_per_block > self.cells_per_window() {
            return invalid(format!(
                "cells_per_block must be in 1..={}, got {}",
                self.cells_per_window(),
                self.cells_per_block
            ));
        }
        if self.spatial_size == 0 {
            return invalid("spatial_size must be > 0".into());
        }
        if self.hist_bins == 0 {
            return invalid("hist_bins must be > 0".into());
        }
        let (lo, hi) = self.hist_range;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return invalid(format!("hist_range must be increasing, got ({lo}, {hi})"));
        }
        if let HogChannel::Single(c) = self.hog_channel {
            if c > 2 {
                return invalid(format!("hog_channel must be 0..=2, got {c}"));
            }
        }
        Ok(())
    }
}
