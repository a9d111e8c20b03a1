use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::detect_vehicles_use_case::DetectVehiclesUseCase;
use crate::classification::infrastructure::model_artifact::ModelArtifact;
use crate::detection::domain::vehicle_detector::{validate_scale, DetectionError};
use crate::detection::infrastructure::multi_scale_detector::MultiScaleDetector;
use crate::detection::infrastructure::window_scanner::{SearchBand, WindowScanner};
use crate::features::infrastructure::hog_color_extractor::HogColorExtractor;
use crate::rendering::infrastructure::rectangle_annotator::RectangleAnnotator;
use crate::shared::constants::{
    DEFAULT_BOX_COLOR, DEFAULT_BOX_THICKNESS, DEFAULT_CELLS_PER_STEP, DEFAULT_SCALES,
};
use crate::tracking::domain::evidence_tracker::{
    TemporalEvidenceTracker, TrackerConfig, TrackerError,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("box_thickness must be >= 1")]
    BoxThickness,
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Static runtime configuration for one run.
///
/// Feature parameters are not part of it; they come from the model
/// artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scales: Vec<f64>,
    pub search_band: SearchBand,
    pub cells_per_step: usize,
    /// Scan the scales of one frame on scoped worker threads.
    pub parallel_scales: bool,
    pub tracker: TrackerConfig,
    pub box_color: [u8; 3],
    pub box_thickness: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scales: DEFAULT_SCALES.to_vec(),
            search_band: SearchBand::default(),
            cells_per_step: DEFAULT_CELLS_PER_STEP,
            parallel_scales: false,
            tracker: TrackerConfig::default(),
            box_color: DEFAULT_BOX_COLOR,
            box_thickness: DEFAULT_BOX_THICKNESS,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scales.is_empty() {
            return Err(DetectionError::NoScales.into());
        }
        for &scale in &self.scales {
            validate_scale(scale)?;
        }
        self.search_band.validate()?;
        if self.cells_per_step == 0 {
            return Err(DetectionError::InvalidStep(self.cells_per_step).into());
        }
        self.tracker.validate()?;
        if self.box_thickness == 0 {
            return Err(ConfigError::BoxThickness);
        }
        Ok(())
    }

    pub fn build_detector(&self, model: ModelArtifact) -> Result<MultiScaleDetector, ConfigError> {
        let (params, scaler, classifier) = model.into_parts();
        let extractor = HogColorExtractor::new(params).map_err(DetectionError::from)?;
        let scanner = WindowScanner::new(
            extractor,
            scaler,
            classifier,
            self.search_band,
            self.cells_per_step,
        )?;
        let detector = MultiScaleDetector::new(scanner, self.scales.clone())?;
        Ok(detector.with_parallel(self.parallel_scales))
    }

    pub fn build_tracker(&self, width: u32, height: u32) -> Result<TemporalEvidenceTracker, ConfigError> {
        Ok(TemporalEvidenceTracker::new(self.tracker, width, height)?)
    }

    pub fn build_annotator(&self) -> Result<RectangleAnnotator, ConfigError> {
        RectangleAnnotator::new(self.box_color, self.box_thickness)
            .map_err(|_| ConfigError::BoxThickness)
    }

    /// Wires detector, tracker and annotator for frames of the given size.
    pub fn build_driver(
        &self,
        model: ModelArtifact,
        width: u32,
        height: u32,
    ) -> Result<DetectVehiclesUseCase, ConfigError> {
        self.validate()?;
        let detector = self.build_detector(model)?;
        let tracker = self.build_tracker(width, height)?;
        let annotator = self.build_annotator()?;

        log::info!(
            "Scales {:?}, band {}..{}, step {} cells, threshold {}, history {} (evict {})",
            self.scales,
            self.search_band.ystart,
            self.search_band
                .ystop
                .map_or_else(|| "bottom".to_string(), |y| y.to_string()),
            self.cells_per_step,
            self.tracker.heat_threshold,
            self.tracker.max_frames,
            self.tracker.evict_count
        );

        Ok(DetectVehiclesUseCase::new(
            Box::new(detector),
            tracker,
            Box::new(annotator),
        ))
    }
}
