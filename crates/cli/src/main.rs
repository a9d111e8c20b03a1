use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use vehicle_detect_core::classification::infrastructure::model_artifact::ModelArtifact;
use vehicle_detect_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use vehicle_detect_core::pipeline::pipeline_config::PipelineConfig;
use vehicle_detect_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use vehicle_detect_core::pipeline::track_vehicles_use_case::TrackVehiclesUseCase;
use vehicle_detect_core::video::domain::frame_reader::FrameReader;
use vehicle_detect_core::video::infrastructure::image_sequence_reader::{
    is_image_path, ImageSequenceReader,
};
use vehicle_detect_core::video::infrastructure::image_sequence_writer::ImageSequenceWriter;

/// Vehicle detection with temporal heat-map tracking for images and
/// image sequences.
#[derive(Parser)]
#[command(name = "vehicle-detect")]
struct Cli {
    /// Input image, or directory of frames processed in file-name order.
    input: PathBuf,

    /// Output image (single-image input) or directory of annotated frames.
    output: PathBuf,

    /// Trained model artifact (JSON).
    #[arg(long)]
    model: PathBuf,

    /// Pipeline configuration (JSON); command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Heat at or below this value is discarded.
    #[arg(long)]
    threshold: Option<u32>,

    /// Frames of detection history kept for the heat map.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Oldest history entries dropped at once when the history overflows.
    #[arg(long)]
    evict_count: Option<usize>,

    /// Window scales (comma-separated), e.g. 1,1.5,2.
    #[arg(long, value_delimiter = ',')]
    scales: Option<Vec<f64>>,

    /// First row of the search band.
    #[arg(long)]
    ystart: Option<u32>,

    /// Row after the last one searched; clamped to the frame height.
    #[arg(long)]
    ystop: Option<u32>,

    /// Search down to the bottom of the frame (ignores --ystop).
    #[arg(long, conflicts_with = "ystop")]
    full_height: bool,

    /// Window step in HOG cells.
    #[arg(long)]
    cells_per_step: Option<usize>,

    /// Scan the scales of each frame on parallel threads.
    #[arg(long)]
    parallel_scales: bool,

    /// Box outline thickness in pixels.
    #[arg(long)]
    box_thickness: Option<u32>,

    /// Also write the thresholded heat map of every frame here.
    #[arg(long)]
    heatmap_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = resolve_config(&cli)?;
    config.validate()?;

    let model = ModelArtifact::load(&cli.model)?;

    let mut reader: Box<dyn FrameReader> = Box::new(ImageSequenceReader::new());
    let metadata = reader.open(&cli.input)?;
    if is_image_path(&cli.output) && !metadata.is_single_image() {
        return Err(format!(
            "Output {} is a single image but the input has {} frames",
            cli.output.display(),
            metadata.total_frames
        )
        .into());
    }

    let driver = config.build_driver(model, metadata.width, metadata.height)?;

    let total = metadata.total_frames;
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(move |current, _| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });

    let mut use_case = TrackVehiclesUseCase::new(
        reader,
        Box::new(ImageSequenceWriter::new()),
        driver,
        Box::new(ThreadedPipelineExecutor::new()),
    )
    .with_progress(progress);
    if let Some(dir) = &cli.heatmap_dir {
        use_case = use_case.with_heat_maps(Box::new(ImageSequenceWriter::new()), dir.clone());
    }

    let mut logger = StdoutPipelineLogger::default();
    let written = use_case.execute(&metadata, &cli.output, &mut logger)?;
    eprintln!();
    log::info!("Wrote {written} frame(s) to {}", cli.output.display());
    if let Some(dir) = &cli.heatmap_dir {
        log::info!("Heat maps written to {}", dir.display());
    }
    Ok(())
}

/// Defaults, then the `--config` file, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(scales) = &cli.scales {
        config.scales = scales.clone();
    }
    if let Some(ystart) = cli.ystart {
        config.search_band.ystart = ystart;
    }
    if cli.full_height {
        config.search_band.ystop = None;
    } else if let Some(ystop) = cli.ystop {
        config.search_band.ystop = Some(ystop);
    }
    if let Some(step) = cli.cells_per_step {
        config.cells_per_step = step;
    }
    if cli.parallel_scales {
        config.parallel_scales = true;
    }
    if let Some(threshold) = cli.threshold {
        config.tracker.heat_threshold = threshold;
    }
    if let Some(max_frames) = cli.max_frames {
        config.tracker.max_frames = max_frames;
    }
    if let Some(evict_count) = cli.evict_count {
        config.tracker.evict_count = evict_count;
    }
    if let Some(thickness) = cli.box_thickness {
        config.box_thickness = thickness;
    }
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if !cli.model.is_file() {
        return Err(format!("Model file not found: {}", cli.model.display()).into());
    }
    if let Some(config) = &cli.config {
        if !config.is_file() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    if let Some(dir) = &cli.heatmap_dir {
        if is_image_path(dir) {
            return Err(format!("--heatmap-dir must be a directory, got {}", dir.display()).into());
        }
        if same_path(dir, &cli.output) {
            return Err("--heatmap-dir must differ from the output directory".into());
        }
    }
    Ok(())
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
