use std::borrow::Cow;
use std::sync::Arc;

use ndarray::{s, Array3};
use serde::{Deserialize, Serialize};

use crate::classification::domain::classifier::{Classifier, FeatureScaler};
use crate::detection::domain::vehicle_detector::{validate_scale, DetectionError};
use crate::features::infrastructure::hog_color_extractor::HogColorExtractor;
use crate::features::infrastructure::resample::resize_bilinear;
use crate::shared::bounding_box::{BoundingBox, BoundingBoxError};
use crate::shared::constants::{DEFAULT_YSTART, DEFAULT_YSTOP};
use crate::shared::frame::Frame;

/// Vertical band `[ystart, ystop)` searched for vehicles.
///
/// `ystop = None` searches to the bottom of the frame; a `ystop` past
/// the bottom is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBand {
    pub ystart: u32,
    pub ystop: Option<u32>,
}

impl Default for SearchBand {
    fn default() -> Self {
        Self {
            ystart: DEFAULT_YSTART,
            ystop: Some(DEFAULT_YSTOP),
        }
    }
}

impl SearchBand {
    pub fn full_frame() -> Self {
        Self {
            ystart: 0,
            ystop: None,
        }
    }

    pub fn validate(&self) -> Result<(), DetectionError> {
        match self.ystop {
            Some(ystop) if ystop <= self.ystart => Err(DetectionError::InvalidSearchBand {
                ystart: self.ystart,
                ystop,
            }),
            _ => Ok(()),
        }
    }

    /// Rows actually searched in a frame of `height`, or `None` when the
    /// band lies below the frame.
    pub fn rows(&self, height: u32) -> Option<(u32, u32)> {
        let ystop = self.ystop.unwrap_or(height).min(height);
        (self.ystart < ystop).then_some((self.ystart, ystop))
    }
}

/// A frame's search band, converted to the feature color space once and
/// shared by every scale.
pub struct SearchRegion {
    image: Array3<f32>,
    ystart: u32,
}

impl SearchRegion {
    pub fn ystart(&self) -> u32 {
        self.ystart
    }

    pub fn height(&self) -> usize {
        self.image.dim().0
    }

    pub fn width(&self) -> usize {
        self.image.dim().1
    }
}

/// Maps a window found in the rescaled search region back to frame
/// coordinates. Truncates toward zero after scaling.
pub fn window_to_frame_box(
    xleft: usize,
    ytop: usize,
    window: usize,
    scale: f64,
    ystart: u32,
) -> Result<BoundingBox, BoundingBoxError> {
    let left = (xleft as f64 * scale) as i32;
    let top = (ytop as f64 * scale) as i32 + ystart as i32;
    let side = (window as f64 * scale) as i32;
    BoundingBox::new(left, top, left + side, top + side)
}

/// Window positions along one axis: `(blocks - blocks_per_window) / step`,
/// zero when the axis holds fewer blocks than one window.
fn window_steps(blocks: usize, blocks_per_window: usize, cells_per_step: usize) -> usize {
    blocks
        .checked_sub(blocks_per_window)
        .map_or(0, |spare| spare / cells_per_step)
}

/// Sliding-window search at a single scale.
///
/// Gradient histograms are computed once per (region, scale) and sliced
/// per window; spatial and color features are computed per window.
pub struct WindowScanner {
    extractor: HogColorExtractor,
    scaler: Arc<dyn FeatureScaler>,
    classifier: Arc<dyn Classifier>,
    band: SearchBand,
    cells_per_step: usize,
}

impl WindowScanner {
    pub fn new(
        extractor: HogColorExtractor,
        scaler: Arc<dyn FeatureScaler>,
        classifier: Arc<dyn Classifier>,
        band: SearchBand,
        cells_per_step: usize,
    ) -> Result<Self, DetectionError> {
        band.validate()?;
        if cells_per_step == 0 {
            return Err(DetectionError::InvalidStep(cells_per_step));
        }

        let expected = extractor.feature_len();
        if scaler.input_len() != expected {
            return Err(DetectionError::FeatureLength {
                component: "scaler",
                expected,
                actual: scaler.input_len(),
            });
        }
        if classifier.input_len() != expected {
            return Err(DetectionError::FeatureLength {
                component: "classifier",
                expected,
                actual: classifier.input_len(),
            });
        }

        Ok(Self {
            extractor,
            scaler,
            classifier,
            band,
            cells_per_step,
        })
    }

    pub fn band(&self) -> SearchBand {
        self.band
    }

    pub fn extractor(&self) -> &HogColorExtractor {
        &self.extractor
    }

    /// Crops the band out of `frame` and converts it to the feature
    /// color space. `None` when the band misses the frame entirely.
    pub fn search_region(&self, frame: &Frame) -> Result<Option<SearchRegion>, DetectionError> {
        frame.validate_rgb()?;
        let Some((ystart, ystop)) = self.band.rows(frame.height()) else {
            log::debug!(
                "Search band starts at row {} but frame {} is only {} rows tall",
                self.band.ystart,
                frame.index(),
                frame.height()
            );
            return Ok(None);
        };

        let rgb = frame.as_ndarray();
        let band = rgb.slice(s![ystart as usize..ystop as usize, .., ..]);
        Ok(Some(SearchRegion {
            image: self.extractor.to_feature_space(band),
            ystart,
        }))
    }

    /// Scans one frame at one scale.
    pub fn scan(&self, frame: &Frame, scale: f64) -> Result<Vec<BoundingBox>, DetectionError> {
        validate_scale(scale)?;
        match self.search_region(frame)? {
            Some(region) => self.scan_region(&region, scale),
            None => Ok(Vec::new()),
        }
    }

    /// Scans a prepared region at `scale`. A region too small for a
    /// single window yields no boxes.
    pub fn scan_region(
        &self,
        region: &SearchRegion,
        scale: f64,
    ) -> Result<Vec<BoundingBox>, DetectionError> {
        validate_scale(scale)?;

        let image: Cow<'_, Array3<f32>> = if scale == 1.0 {
            Cow::Borrowed(&region.image)
        } else {
            let out_h = (region.height() as f64 / scale) as usize;
            let out_w = (region.width() as f64 / scale) as usize;
            if out_h == 0 || out_w == 0 {
                return Ok(Vec::new());
            }
            Cow::Owned(resize_bilinear(region.image.view(), out_h, out_w))
        };

        let params = self.extractor.params();
        let pixels_per_cell = params.pixels_per_cell;
        let window = params.window_size();

        let grid = self.extractor.gradient_grid(image.view());
        let bpw = grid.blocks_per_window();
        let nx = window_steps(grid.blocks_x(), bpw, self.cells_per_step);
        let ny = window_steps(grid.blocks_y(), bpw, self.cells_per_step);

        let mut boxes = Vec::new();
        let mut features = Vec::with_capacity(self.extractor.feature_len());

        for yb in 0..ny {
            for xb in 0..nx {
                let ypos = yb * self.cells_per_step;
                let xpos = xb * self.cells_per_step;
                let xleft = xpos * pixels_per_cell;
                let ytop = ypos * pixels_per_cell;

                features.clear();
                let patch = image.slice(s![ytop..ytop + window, xleft..xleft + window, ..]);
                self.extractor.color_features(patch, &mut features);
                let fits = grid.window_features(ypos, xpos, &mut features);
                debug_assert!(fits, "window ({xpos}, {ypos}) outside gradient grid");

                let scaled = self.scaler.transform(&features)?;
                if self.classifier.predict(&scaled)? {
                    boxes.push(window_to_frame_box(
                        xleft,
                        ytop,
                        window,
                        scale,
                        region.ystart,
                    )?);
                }
            }
        }

        log::debug!(
            "scale {scale}: {} windows, {} positive",
            nx * ny,
            boxes.len()
        );
        Ok(boxes)
    }
}
