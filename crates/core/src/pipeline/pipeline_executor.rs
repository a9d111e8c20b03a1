use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::detect_vehicles_use_case::DetectVehiclesUseCase;
use super::pipeline_logger::PipelineLogger;
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_reader::FrameReader;
use crate::video::domain::frame_writer::FrameWriter;

/// Secondary output receiving a grayscale rendering of the thresholded
/// heat map for every processed frame.
pub struct HeatMapOutput {
    pub writer: Box<dyn FrameWriter>,
    pub path: PathBuf,
}

/// Per-run options for a pipeline execution.
pub struct RunOptions {
    /// Called after each written frame with `(processed, total)`.
    /// Returning `false` cancels the run.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
    pub heat_maps: Option<HeatMapOutput>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            heat_maps: None,
        }
    }
}

/// Abstracts how the read → detect/track/render → write pipeline runs.
///
/// The driver is moved in whole: whichever thread runs it owns the
/// tracker, and frames reach it strictly in reader order.
pub trait PipelineExecutor: Send {
    /// Returns the number of frames written.
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        reader: Box<dyn FrameReader>,
        writer: Box<dyn FrameWriter>,
        driver: DetectVehiclesUseCase,
        metadata: &SequenceMetadata,
        output_path: &Path,
        options: RunOptions,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, Box<dyn std::error::Error>>;
}
