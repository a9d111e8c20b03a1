use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::detect_vehicles_use_case::DetectVehiclesUseCase;
use super::pipeline_executor::{HeatMapOutput, PipelineExecutor, RunOptions};
use super::pipeline_logger::PipelineLogger;
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_reader::FrameReader;
use crate::video::domain::frame_writer::FrameWriter;

/// Runs a whole frame sequence through the vehicle pipeline.
///
/// Wires the reader, writer and per-frame driver together and delegates
/// execution to a `PipelineExecutor`. Single-use: `execute` consumes the
/// owned components, so a second call fails.
pub struct TrackVehiclesUseCase {
    reader: Option<Box<dyn FrameReader>>,
    writer: Option<Box<dyn FrameWriter>>,
    driver: Option<DetectVehiclesUseCase>,
    executor: Box<dyn PipelineExecutor>,
    heat_maps: Option<HeatMapOutput>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl TrackVehiclesUseCase {
    pub fn new(
        reader: Box<dyn FrameReader>,
        writer: Box<dyn FrameWriter>,
        driver: DetectVehiclesUseCase,
        executor: Box<dyn PipelineExecutor>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            driver: Some(driver),
            executor,
            heat_maps: None,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Also write the thresholded heat map of every frame through `writer`.
    pub fn with_heat_maps(mut self, writer: Box<dyn FrameWriter>, path: PathBuf) -> Self {
        self.heat_maps = Some(HeatMapOutput { writer, path });
        self
    }

    pub fn with_progress(mut self, on_progress: Box<dyn Fn(usize, usize) -> bool + Send>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Returns the number of frames written.
    pub fn execute(
        &mut self,
        metadata: &SequenceMetadata,
        output_path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let options = RunOptions {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
            heat_maps: self.heat_maps.take(),
        };

        self.executor.execute(
            self.reader.take().ok_or("Pipeline already executed")?,
            self.writer.take().ok_or("Pipeline already executed")?,
            self.driver.take().ok_or("Pipeline already executed")?,
            metadata,
            output_path,
            options,
            logger,
        )
    }
}
