use std::thread;

use super::window_scanner::WindowScanner;
use crate::detection::domain::vehicle_detector::{validate_scale, DetectionError, VehicleDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Runs the window scanner at every configured scale and concatenates
/// the results in scale order. Overlaps are left for the tracker.
pub struct MultiScaleDetector {
    scanner: WindowScanner,
    scales: Vec<f64>,
    parallel: bool,
}

impl MultiScaleDetector {
    pub fn new(scanner: WindowScanner, scales: Vec<f64>) -> Result<Self, DetectionError> {
        if scales.is_empty() {
            return Err(DetectionError::NoScales);
        }
        for &scale in &scales {
            validate_scale(scale)?;
        }
        Ok(Self {
            scanner,
            scales,
            parallel: false,
        })
    }

    /// Scan scales on scoped worker threads, one per scale.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn detect_all(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
        let Some(region) = self.scanner.search_region(frame)? else {
            return Ok(Vec::new());
        };

        let per_scale: Vec<Result<Vec<BoundingBox>, DetectionError>> = if self.parallel {
            let region = &region;
            let scanner = &self.scanner;
            thread::scope(|s| {
                let handles: Vec<_> = self
                    .scales
                    .iter()
                    .map(|&scale| s.spawn(move || scanner.scan_region(region, scale)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect()
            })
        } else {
            self.scales
                .iter()
                .map(|&scale| self.scanner.scan_region(&region, scale))
                .collect()
        };

        let mut boxes = Vec::new();
        for result in per_scale {
            boxes.extend(result?);
        }
        log::debug!(
            "frame {}: {} raw detections over {} scales",
            frame.index(),
            boxes.len(),
            self.scales.len()
        );
        Ok(boxes)
    }
}

impl VehicleDetector for MultiScaleDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
        self.detect_all(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::window_scanner::tests::{
        bright_scanner, frame_with_white_rect,
    };
    use crate::detection::infrastructure::window_scanner::SearchBand;

    fn frame() -> Frame {
        // One white 64x64 square at (64, 16): found at scale 1 only
        frame_with_white_rect(256, 256, (64, 16, 128, 80))
    }

    #[test]
    fn test_rejects_empty_scale_list() {
        let result = MultiScaleDetector::new(bright_scanner(SearchBand::full_frame()), vec![]);
        assert!(matches!(result, Err(DetectionError::NoScales)));
    }

    #[test]
    fn test_rejects_invalid_scale_in_list() {
        let result =
            MultiScaleDetector::new(bright_scanner(SearchBand::full_frame()), vec![1.0, 0.0]);
        assert!(matches!(result, Err(DetectionError::InvalidScale(_))));
    }

    #[test]
    fn test_concatenates_without_dedup() {
        let mut detector =
            MultiScaleDetector::new(bright_scanner(SearchBand::full_frame()), vec![1.0, 1.0])
                .unwrap();
        let boxes = detector.detect(&frame()).unwrap();
        let expected = BoundingBox::new(64, 16, 128, 80).unwrap();
        assert_eq!(boxes, vec![expected, expected]);
    }

    #[test]
    fn test_merges_scales_in_order() {
        // A 128x128 square: one exact window at scale 2, a 5x5 grid of
        // fully covered windows at scale 1.
        let frame = frame_with_white_rect(512, 512, (256, 256, 384, 384));
        let detector = MultiScaleDetector::new(
            bright_scanner(SearchBand::full_frame()),
            vec![2.0, 1.0],
        )
        .unwrap();
        let boxes = detector.detect_all(&frame).unwrap();
        assert_eq!(boxes.len(), 26);
        assert_eq!(boxes[0], BoundingBox::new(256, 256, 384, 384).unwrap());
        assert!(boxes[1..].iter().all(|b| b.width() == 64));
        assert_eq!(boxes[1], BoundingBox::new(256, 256, 320, 320).unwrap());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let scales = vec![1.0, 1.5, 2.0];
        let sequential =
            MultiScaleDetector::new(bright_scanner(SearchBand::full_frame()), scales.clone())
                .unwrap();
        let parallel = MultiScaleDetector::new(bright_scanner(SearchBand::full_frame()), scales)
            .unwrap()
            .with_parallel(true);
        let f = frame();
        assert_eq!(
            sequential.detect_all(&f).unwrap(),
            parallel.detect_all(&f).unwrap()
        );
    }

    #[test]
    fn test_band_outside_frame_yields_nothing() {
        let detector = MultiScaleDetector::new(
            bright_scanner(SearchBand {
                ystart: 300,
                ystop: None,
            }),
            vec![1.0],
        )
        .unwrap();
        assert!(detector.detect_all(&frame()).unwrap().is_empty());
    }
}
