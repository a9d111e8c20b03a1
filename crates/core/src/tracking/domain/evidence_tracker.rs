use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::heat_map::HeatMap;
use super::labeled_region::LabeledRegion;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{DEFAULT_EVICT_COUNT, DEFAULT_HEAT_THRESHOLD, DEFAULT_MAX_FRAMES};
use crate::shared::frame::{Frame, FrameError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("max_frames must be >= 1, got {0}")]
    InvalidCapacity(usize),
    #[error("evict_count must be in 1..={max_frames}, got {evict_count}")]
    InvalidEvictCount { evict_count: usize, max_frames: usize },
    #[error("tracker dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// History capacity in frames.
    pub max_frames: usize,
    /// Oldest entries dropped at once when the history overflows.
    pub evict_count: usize,
    /// Heat at or below this value is discarded before labeling.
    pub heat_threshold: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            evict_count: DEFAULT_EVICT_COUNT,
            heat_threshold: DEFAULT_HEAT_THRESHOLD,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.max_frames == 0 {
            return Err(TrackerError::InvalidCapacity(self.max_frames));
        }
        if self.evict_count == 0 || self.evict_count > self.max_frames {
            return Err(TrackerError::InvalidEvictCount {
                evict_count: self.evict_count,
                max_frames: self.max_frames,
            });
        }
        Ok(())
    }
}

/// Bounded per-frame detection history turned into stable regions via a
/// thresholded heat map.
///
/// The history never holds more than `max_frames` entries. When a record
/// pushes it past capacity, the `evict_count` oldest entries are dropped
/// in one burst, so the history steps down and then refills.
pub struct TemporalEvidenceTracker {
    config: TrackerConfig,
    width: u32,
    height: u32,
    history: VecDeque<Vec<BoundingBox>>,
    frame_count: usize,
}

impl TemporalEvidenceTracker {
    pub fn new(config: TrackerConfig, width: u32, height: u32) -> Result<Self, TrackerError> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(TrackerError::InvalidDimensions { width, height });
        }
        Ok(Self {
            config,
            width,
            height,
            history: VecDeque::with_capacity(config.max_frames + 1),
            frame_count: 0,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames recorded since construction (or the last reset).
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Retained detection sets, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &[BoundingBox]> {
        self.history.iter().map(Vec::as_slice)
    }

    /// Rejects frames that are not RGB or do not match the tracker size.
    pub fn check_frame(&self, frame: &Frame) -> Result<(), TrackerError> {
        frame.validate_rgb()?;
        frame.ensure_dimensions(self.width, self.height)?;
        Ok(())
    }

    pub fn record(&mut self, detections: Vec<BoundingBox>) {
        let outside = detections
            .iter()
            .filter(|b| b.clip(self.width, self.height).is_none())
            .count();
        if outside > 0 {
            log::warn!(
                "{outside} of {} detections lie outside the {}x{} frame",
                detections.len(),
                self.width,
                self.height
            );
        }

        self.history.push_back(detections);
        if self.history.len() > self.config.max_frames {
            self.history.drain(..self.config.evict_count);
        }
        self.frame_count += 1;
    }

    /// Heat accumulated from every retained box, before thresholding.
    pub fn heat_map(&self) -> HeatMap {
        let mut heat = HeatMap::new(self.width, self.height);
        for detections in &self.history {
            heat.add_heat(detections);
        }
        heat
    }

    /// Heat with everything at or below the threshold zeroed.
    pub fn thresholded_heat_map(&self) -> HeatMap {
        let mut heat = self.heat_map();
        heat.apply_threshold(self.config.heat_threshold);
        heat
    }

    pub fn compute_regions(&self) -> Vec<LabeledRegion> {
        if self.history.is_empty() {
            return Vec::new();
        }
        let heat = self.thresholded_heat_map();
        let regions = heat.label();
        log::trace!(
            "history {} frames, peak heat {}, {} regions",
            self.history.len(),
            heat.max(),
            regions.len()
        );
        regions
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.frame_count = 0;
    }
}
