use std::collections::HashMap;
use std::time::Instant;

use super::detect_vehicles_use_case::ProcessedFrame;

pub const STAGE_DETECT: &str = "detect";
pub const STAGE_TRACK: &str = "track";
pub const STAGE_RENDER: &str = "render";

pub const METRIC_RAW_BOXES: &str = "raw_boxes";
pub const METRIC_REGIONS: &str = "regions";
pub const METRIC_HISTORY_LEN: &str = "history_len";

/// Cross-cutting logger for pipeline orchestration events.
///
/// Keeps executors independent of where progress and statistics end up
/// (the `log` crate, a test probe, nowhere).
pub trait PipelineLogger: Send {
    /// Report frame-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named pipeline stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. queue depth, region count).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-pipeline summary. Default: no-op.
    fn summary(&self) {}

    /// Records the per-stage timings and tracking metrics of one frame.
    fn frame_processed(&mut self, processed: &ProcessedFrame) {
        self.timing(STAGE_DETECT, processed.timings.detect_ms);
        self.timing(STAGE_TRACK, processed.timings.track_ms);
        self.timing(STAGE_RENDER, processed.timings.render_ms);
        self.metric(METRIC_RAW_BOXES, processed.raw_detections as f64);
        self.metric(METRIC_REGIONS, processed.regions.len() as f64);
        self.metric(METRIC_HISTORY_LEN, processed.history_len as f64);
    }
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: keeps per-stage timings and metrics for an end-of-run
/// summary, and reports progress every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    total_frames: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = Vec::new();

        lines.push(format!(
            "Pipeline summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_frames = total;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detect_vehicles_use_case::StageTimings;
    use crate::shared::frame::Frame;

    fn processed(raw: usize, history_len: usize) -> ProcessedFrame {
        ProcessedFrame {
            frame: Frame::new(vec![0u8; 3], 1, 1, 3, 0),
            regions: Vec::new(),
            raw_detections: raw,
            history_len,
            heat_map: None,
            timings: StageTimings {
                detect_ms: 40.0,
                track_ms: 2.0,
                render_ms: 1.0,
            },
        }
    }

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing(STAGE_DETECT, 5.0);
        logger.metric(METRIC_REGIONS, 3.0);
        logger.info("hello");
        logger.frame_processed(&processed(1, 1));
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing(STAGE_DETECT, 20.0);
        logger.timing(STAGE_DETECT, 30.0);
        logger.timing(STAGE_RENDER, 5.0);

        let detect = logger.timings_for(STAGE_DETECT).unwrap();
        assert_eq!(detect, &[20.0, 30.0]);
        assert_eq!(logger.timings_for(STAGE_RENDER).unwrap(), &[5.0]);
        assert!(logger.timings_for(STAGE_TRACK).is_none());
    }

    #[test]
    fn test_frame_processed_fans_out() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.frame_processed(&processed(12, 4));
        logger.frame_processed(&processed(8, 5));

        assert_eq!(logger.timings_for(STAGE_DETECT).unwrap(), &[40.0, 40.0]);
        assert_eq!(logger.timings_for(STAGE_TRACK).unwrap().len(), 2);
        assert_eq!(logger.metrics_for(METRIC_RAW_BOXES).unwrap(), &[12.0, 8.0]);
        assert_eq!(logger.metrics_for(METRIC_HISTORY_LEN).unwrap(), &[4.0, 5.0]);
        assert_eq!(logger.metrics_for(METRIC_REGIONS).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_summary_includes_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.total_frames = 2;
        logger.frame_processed(&processed(12, 4));
        logger.frame_processed(&processed(8, 5));

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary"));
        for name in [STAGE_DETECT, STAGE_TRACK, STAGE_RENDER, METRIC_RAW_BOXES] {
            assert!(summary.contains(name), "missing {name}");
        }
        assert!(summary.contains("raw_boxes: avg 10.0"));
        assert!(summary.contains("history_len: avg 4.5"));
    }

    #[test]
    fn test_summary_includes_fps() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.total_frames = 100;
        logger.timing(STAGE_DETECT, 10.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_total() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.total_frames, 20);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("model loaded");
        assert_eq!(logger.messages, vec!["model loaded".to_string()]);
    }

    #[test]
    fn test_zero_throttle_clamped() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
        assert_eq!(StdoutPipelineLogger::default().throttle_frames, 10);
    }
}
