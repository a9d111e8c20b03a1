use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::detect_vehicles_use_case::DetectVehiclesUseCase;
use crate::pipeline::pipeline_executor::{PipelineExecutor, RunOptions};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::rendering::infrastructure::heat_map_renderer::render_heat_map;
use crate::shared::frame::Frame;
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_reader::FrameReader;
use crate::video::domain::frame_writer::FrameWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;
type WriterHandle = JoinHandle<Result<(Box<dyn FrameWriter>, Option<Box<dyn FrameWriter>>), SendError>>;

struct WriteJob {
    frame: Frame,
    heat: Option<Frame>,
}

/// Executes the vehicle pipeline with dedicated threads for I/O.
///
/// Layout: `reader → main [detect/track/render] → writer`
///
/// The calling thread runs the driver and therefore owns the tracker.
/// Decoding and encoding overlap with detection, which dominates the
/// per-frame cost.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(capacity: usize) -> Self {
        Self {
            channel_capacity: capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        reader: Box<dyn FrameReader>,
        mut writer: Box<dyn FrameWriter>,
        driver: DetectVehiclesUseCase,
        metadata: &SequenceMetadata,
        output_path: &Path,
        options: RunOptions,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let cap = self.channel_capacity;
        let RunOptions {
            on_progress,
            cancelled,
            heat_maps,
        } = options;

        writer.open(output_path, metadata)?;
        let heat_writer = match heat_maps {
            Some(mut output) => {
                output.writer.open(&output.path, metadata)?;
                Some(output.writer)
            }
            None => None,
        };
        let driver = driver.with_heat_capture(heat_writer.is_some());

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<WriteJob>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, cancelled.clone());
        let writer_handle = spawn_writer(writer, heat_writer, write_rx);

        let loop_state = MainLoop {
            total_frames: metadata.total_frames,
            on_progress: on_progress.as_deref(),
            cancelled: &cancelled,
        };
        let (frames_processed, main_error) = loop_state.run(driver, frame_rx, &write_tx, logger);

        drop(write_tx);

        join_threads(reader_handle, writer_handle, main_error)?;
        logger.summary();
        Ok(frames_processed)
    }
}

fn spawn_reader(
    mut reader: Box<dyn FrameReader>,
    frame_tx: Sender<Result<Frame, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn FrameReader>> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        reader.close();
        reader
    })
}

fn spawn_writer(
    mut writer: Box<dyn FrameWriter>,
    mut heat_writer: Option<Box<dyn FrameWriter>>,
    write_rx: Receiver<WriteJob>,
) -> WriterHandle {
    std::thread::spawn(move || {
        for job in write_rx {
            writer
                .write(&job.frame)
                .map_err(|e| -> SendError { e.to_string().into() })?;
            if let (Some(heat_writer), Some(heat)) = (heat_writer.as_mut(), job.heat.as_ref()) {
                heat_writer
                    .write(heat)
                    .map_err(|e| -> SendError { e.to_string().into() })?;
            }
        }
        Ok((writer, heat_writer))
    })
}

struct MainLoop<'a> {
    total_frames: usize,
    on_progress: Option<&'a (dyn Fn(usize, usize) -> bool + Send)>,
    cancelled: &'a AtomicBool,
}

impl MainLoop<'_> {
    /// Receives frames in order, runs them through the driver and hands
    /// the results to the writer. Returns the number of frames sent and
    /// the first error, if any.
    fn run(
        &self,
        mut driver: DetectVehiclesUseCase,
        frame_rx: Receiver<Result<Frame, SendError>>,
        write_tx: &Sender<WriteJob>,
        logger: &mut dyn PipelineLogger,
    ) -> (usize, Option<Box<dyn std::error::Error>>) {
        let mut frames_processed = 0usize;

        for frame_result in frame_rx {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => return (frames_processed, Some(e.to_string().into())),
            };

            let processed = match driver.process_frame(&frame) {
                Ok(processed) => processed,
                Err(e) => return (frames_processed, Some(e)),
            };
            logger.frame_processed(&processed);

            let heat = processed
                .heat_map
                .as_ref()
                .map(|heat| render_heat_map(heat, frame.index()));
            let job = WriteJob {
                frame: processed.frame,
                heat,
            };
            if write_tx.send(job).is_err() {
                return (
                    frames_processed,
                    Some("Writer channel closed unexpectedly".into()),
                );
            }

            frames_processed += 1;
            logger.progress(frames_processed, self.total_frames);

            if let Some(callback) = self.on_progress {
                if !callback(frames_processed, self.total_frames) {
                    self.cancelled.store(true, Ordering::Relaxed);
                    return (frames_processed, Some("Cancelled".into()));
                }
            }
        }

        (frames_processed, None)
    }
}

/// Joins the I/O threads and coalesces the first error encountered.
fn join_threads(
    reader_handle: JoinHandle<Box<dyn FrameReader>>,
    writer_handle: WriterHandle,
    mut first_error: Option<Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    fn set_if_none(slot: &mut Option<Box<dyn std::error::Error>>, err: Box<dyn std::error::Error>) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    match reader_handle.join() {
        Ok(mut r) => r.close(),
        Err(_) => set_if_none(&mut first_error, "Reader thread panicked".into()),
    }

    match writer_handle.join() {
        Ok(Ok((mut w, heat_writer))) => {
            if let Err(e) = w.close() {
                set_if_none(&mut first_error, e);
            }
            if let Some(mut hw) = heat_writer {
                if let Err(e) = hw.close() {
                    set_if_none(&mut first_error, e);
                }
            }
        }
        Ok(Err(e)) => set_if_none(&mut first_error, e.to_string().into()),
        Err(_) => set_if_none(&mut first_error, "Writer thread panicked".into()),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
