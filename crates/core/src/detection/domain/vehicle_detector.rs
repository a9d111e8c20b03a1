use thiserror::Error;

use crate::classification::domain::classifier::ClassificationError;
use crate::features::domain::feature_params::FeatureError;
use crate::shared::bounding_box::{BoundingBox, BoundingBoxError};
use crate::shared::frame::{Frame, FrameError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("scale must be finite and > 0, got {0}")]
    InvalidScale(f64),
    #[error("search band [{ystart}, {ystop}) is empty")]
    InvalidSearchBand { ystart: u32, ystop: u32 },
    #[error("cells_per_step must be >= 1, got {0}")]
    InvalidStep(usize),
    #[error("at least one scale is required")]
    NoScales,
    #[error("{component} expects {actual} features, extractor produces {expected}")]
    FeatureLength {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    BoundingBox(#[from] BoundingBoxError),
}

/// Domain interface for per-frame vehicle detection.
///
/// Returns raw, possibly overlapping boxes in frame coordinates. Takes
/// `&mut self` so implementations may cache across frames.
pub trait VehicleDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError>;
}

/// Rejects zero, negative and non-finite scales.
pub fn validate_scale(scale: f64) -> Result<(), DetectionError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(DetectionError::InvalidScale(scale));
    }
    Ok(())
}
