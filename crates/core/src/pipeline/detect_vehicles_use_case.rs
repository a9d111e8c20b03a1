use std::time::Instant;

use crate::detection::domain::vehicle_detector::VehicleDetector;
use crate::rendering::domain::frame_annotator::FrameAnnotator;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::domain::evidence_tracker::TemporalEvidenceTracker;
use crate::tracking::domain::heat_map::HeatMap;
use crate::tracking::domain::labeled_region::LabeledRegion;

/// Wall-clock time spent in each stage of one frame, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTimings {
    pub detect_ms: f64,
    pub track_ms: f64,
    pub render_ms: f64,
}

/// Result of pushing one frame through detect → track → render.
pub struct ProcessedFrame {
    /// Copy of the input with stable vehicle boxes drawn.
    pub frame: Frame,
    pub regions: Vec<LabeledRegion>,
    pub raw_detections: usize,
    pub history_len: usize,
    /// Thresholded heat, when heat capture is enabled.
    pub heat_map: Option<HeatMap>,
    pub timings: StageTimings,
}

/// Per-frame driver: multi-scale detection, temporal evidence, drawing.
///
/// Frames must arrive in order; all cross-frame state lives in the owned
/// tracker.
pub struct DetectVehiclesUseCase {
    detector: Box<dyn VehicleDetector>,
    tracker: TemporalEvidenceTracker,
    annotator: Box<dyn FrameAnnotator>,
    capture_heat: bool,
}

impl DetectVehiclesUseCase {
    pub fn new(
        detector: Box<dyn VehicleDetector>,
        tracker: TemporalEvidenceTracker,
        annotator: Box<dyn FrameAnnotator>,
    ) -> Self {
        Self {
            detector,
            tracker,
            annotator,
            capture_heat: false,
        }
    }

    /// Also return the thresholded heat map with every processed frame.
    pub fn with_heat_capture(mut self, capture_heat: bool) -> Self {
        self.capture_heat = capture_heat;
        self
    }

    pub fn tracker(&self) -> &TemporalEvidenceTracker {
        &self.tracker
    }

    /// Validates the frame before touching any state, so a rejected frame
    /// leaves the tracker unchanged.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
    ) -> Result<ProcessedFrame, Box<dyn std::error::Error>> {
        self.tracker.check_frame(frame)?;

        let start = Instant::now();
        let detections = self.detector.detect(frame)?;
        let detect_ms = elapsed_ms(start);
        let raw_detections = detections.len();

        let start = Instant::now();
        self.tracker.record(detections);
        let regions = self.tracker.compute_regions();
        let heat_map = self
            .capture_heat
            .then(|| self.tracker.thresholded_heat_map());
        let track_ms = elapsed_ms(start);

        let start = Instant::now();
        let mut annotated = frame.clone();
        let boxes: Vec<BoundingBox> = regions.iter().map(|r| r.bbox).collect();
        self.annotator.annotate(&mut annotated, &boxes)?;
        let render_ms = elapsed_ms(start);

        log::trace!(
            "frame {}: {raw_detections} raw boxes, {} regions",
            frame.index(),
            regions.len()
        );

        Ok(ProcessedFrame {
            frame: annotated,
            regions,
            raw_detections,
            history_len: self.tracker.history_len(),
            heat_map,
            timings: StageTimings {
                detect_ms,
                track_ms,
                render_ms,
            },
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detection::domain::vehicle_detector::DetectionError;
    use crate::tracking::domain::evidence_tracker::TrackerConfig;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Returns the same boxes for every frame and counts calls.
    pub(crate) struct StubDetector {
        pub boxes: Vec<BoundingBox>,
        pub calls: Arc<Mutex<usize>>,
    }

    impl StubDetector {
        pub(crate) fn new(boxes: Vec<BoundingBox>) -> Self {
            Self {
                boxes,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl VehicleDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.boxes.clone())
        }
    }

    struct FailingDetector;

    impl VehicleDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, DetectionError> {
            Err(DetectionError::NoScales)
        }
    }

    /// Marks the top-left pixel of every box with 255 in all channels.
    pub(crate) struct StubAnnotator {
        pub drawn: Arc<Mutex<Vec<Vec<BoundingBox>>>>,
    }

    impl StubAnnotator {
        pub(crate) fn new() -> Self {
            Self {
                drawn: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FrameAnnotator for StubAnnotator {
        fn annotate(
            &self,
            frame: &mut Frame,
            boxes: &[BoundingBox],
        ) -> Result<(), Box<dyn std::error::Error>> {
            let w = frame.width() as usize;
            for b in boxes {
                let offset = (b.top() as usize * w + b.left() as usize) * 3;
                frame.data_mut()[offset..offset + 3].fill(255);
            }
            self.drawn.lock().unwrap().push(boxes.to_vec());
            Ok(())
        }
    }

    pub(crate) fn frame(w: u32, h: u32, index: usize) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, index)
    }

    fn bbox(l: i32, t: i32, r: i32, b: i32) -> BoundingBox {
        BoundingBox::new(l, t, r, b).unwrap()
    }

    fn use_case(
        detector: Box<dyn VehicleDetector>,
        threshold: u32,
    ) -> (DetectVehiclesUseCase, Arc<Mutex<Vec<Vec<BoundingBox>>>>) {
        let tracker = TemporalEvidenceTracker::new(
            TrackerConfig {
                max_frames: 5,
                evict_count: 2,
                heat_threshold: threshold,
            },
            100,
            100,
        )
        .unwrap();
        let annotator = StubAnnotator::new();
        let drawn = annotator.drawn.clone();
        (
            DetectVehiclesUseCase::new(detector, tracker, Box::new(annotator)),
            drawn,
        )
    }

    #[test]
    fn test_regions_appear_once_heat_exceeds_threshold() {
        let detector = StubDetector::new(vec![bbox(10, 10, 30, 30)]);
        let (mut uc, drawn) = use_case(Box::new(detector), 2);

        for i in 0..2 {
            let out = uc.process_frame(&frame(100, 100, i)).unwrap();
            assert!(out.regions.is_empty());
            assert_eq!(out.raw_detections, 1);
        }
        let out = uc.process_frame(&frame(100, 100, 2)).unwrap();
        assert_eq!(out.regions.len(), 1);
        assert_eq!(out.regions[0].bbox, bbox(10, 10, 30, 30));
        assert_eq!(out.history_len, 3);
        assert_eq!(out.frame.index(), 2);

        let drawn = drawn.lock().unwrap();
        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn[2], vec![bbox(10, 10, 30, 30)]);
    }

    #[test]
    fn test_input_frame_not_modified() {
        let detector = StubDetector::new(vec![bbox(0, 0, 10, 10)]);
        let (mut uc, _) = use_case(Box::new(detector), 0);
        let input = frame(100, 100, 0);
        let out = uc.process_frame(&input).unwrap();
        assert_eq!(out.frame.data()[0], 255);
        assert_eq!(input.data()[0], 0);
    }

    #[test]
    fn test_mismatched_frame_rejected_before_detection() {
        let detector = StubDetector::new(vec![bbox(0, 0, 10, 10)]);
        let calls = detector.calls.clone();
        let (mut uc, _) = use_case(Box::new(detector), 0);

        assert!(uc.process_frame(&frame(50, 100, 0)).is_err());
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(uc.tracker().frame_count(), 0);
    }

    #[test]
    fn test_non_rgb_frame_rejected() {
        let (mut uc, _) = use_case(Box::new(StubDetector::new(vec![])), 0);
        let gray = Frame::new(vec![0u8; 100 * 100], 100, 100, 1, 0);
        assert!(uc.process_frame(&gray).is_err());
    }

    #[test]
    fn test_detector_error_propagates() {
        let (mut uc, drawn) = use_case(Box::new(FailingDetector), 0);
        assert!(uc.process_frame(&frame(100, 100, 0)).is_err());
        assert!(drawn.lock().unwrap().is_empty());
        assert_eq!(uc.tracker().history_len(), 0);
    }

    #[test]
    fn test_heat_capture() {
        let detector = StubDetector::new(vec![bbox(0, 0, 10, 10)]);
        let (uc, _) = use_case(Box::new(detector), 0);
        let mut uc = uc.with_heat_capture(true);
        let out = uc.process_frame(&frame(100, 100, 0)).unwrap();
        let heat = out.heat_map.unwrap();
        assert_eq!(heat.get(5, 5), 1);
        assert_eq!(heat.get(50, 50), 0);
    }

    #[test]
    fn test_heat_not_captured_by_default() {
        let (mut uc, _) = use_case(Box::new(StubDetector::new(vec![])), 0);
        assert!(uc.process_frame(&frame(100, 100, 0)).unwrap().heat_map.is_none());
    }
}
