use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;

use people_census_core::detection::infrastructure::execution_provider::intra_threads_per_worker;
use people_census_core::detection::infrastructure::onnx_model_provider::OnnxModelProvider;
use people_census_core::identity::person_sequence::PersonSequence;
use people_census_core::pipeline::domain::progress::LogProgressObserver;
use people_census_core::pipeline::domain::result_writer::ResultWriter;
use people_census_core::pipeline::domain::video_result::VideoTask;
use people_census_core::pipeline::infrastructure::json_result_writer::JsonResultWriter;
use people_census_core::pipeline::orchestrator::{worker_count, Orchestrator, OrchestratorConfig};
use people_census_core::pipeline::result_aggregator::ResultAggregator;
use people_census_core::pipeline::video_worker::{
    IssuancePolicy, ReaderFactory, VideoWorker, WorkerConfig, WorkerContext,
};
use people_census_core::shared::constants::{
    GARMENT_CONFIDENCE_THRESHOLD, GARMENT_MODEL_NAME, MAX_WORKERS, MIN_CROP_SIDE,
    PERSON_CONFIDENCE_THRESHOLD, PERSON_MODEL_NAME, PERSON_MODEL_URL, SAMPLING_STRIDE,
    VIDEO_EXTENSIONS,
};
use people_census_core::shared::model_resolver::{self, ModelSource};
use people_census_core::video::domain::video_reader::VideoReader;
use people_census_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use people_census_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Counts unique people across a batch of videos and tags their garments.
#[derive(Parser)]
#[command(name = "people-census")]
struct Cli {
    /// Videos to process. Defaults to every video in the current directory.
    videos: Vec<PathBuf>,

    /// Root directory for crops and result files.
    #[arg(long, short, default_value = "detected_people_concurrent")]
    output: PathBuf,

    /// Number of videos processed at once (default: min(videos, cores, 4)).
    #[arg(long)]
    workers: Option<usize>,

    /// Person detector: a file path or a cached model name.
    #[arg(long, default_value = PERSON_MODEL_NAME)]
    person_model: String,

    /// Garment detector: a file path or a cached model name.
    #[arg(long, default_value = GARMENT_MODEL_NAME)]
    garment_model: String,

    /// Garment class names, one per line.
    #[arg(long)]
    garment_labels: Option<PathBuf>,

    /// Run detection on every Nth frame.
    #[arg(long, default_value_t = SAMPLING_STRIDE)]
    stride: usize,

    /// Person confidence threshold (0.0-1.0, exclusive).
    #[arg(long, default_value_t = PERSON_CONFIDENCE_THRESHOLD)]
    person_confidence: f64,

    /// Garment confidence threshold (0.0-1.0, exclusive).
    #[arg(long, default_value_t = GARMENT_CONFIDENCE_THRESHOLD)]
    garment_confidence: f64,

    /// Minimum width and height of a person crop, in pixels.
    #[arg(long, default_value_t = MIN_CROP_SIDE)]
    min_crop: u32,

    /// Number people before the crop size check, so rejected crops use up
    /// numbers.
    #[arg(long)]
    eager_numbering: bool,
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

    let videos = if cli.videos.is_empty() {
        discover_videos(Path::new("."))?
    } else {
        cli.videos.clone()
    };
    if videos.is_empty() {
        return Err(format!(
            "No video files found (looked for: {})",
            VIDEO_EXTENSIONS.join(", ")
        )
        .into());
    }
    log::info!("Found {} video files: {:?}", videos.len(), videos);

    std::fs::create_dir_all(&cli.output)?;

    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let workers = worker_count(videos.len(), cores, MAX_WORKERS, cli.workers);
    let models = build_model_provider(&cli, workers)?;

    let results: Arc<dyn ResultWriter> = Arc::new(JsonResultWriter::new());
    let readers: ReaderFactory =
        Arc::new(|| -> Box<dyn VideoReader> { Box::new(FfmpegReader::new()) });
    let worker = VideoWorker::new(WorkerContext {
        sequence: Arc::new(PersonSequence::new()),
        models: Arc::new(models),
        readers,
        images: Arc::new(ImageFileWriter::new()),
        results: results.clone(),
        progress: Arc::new(LogProgressObserver),
        cancelled: Arc::new(AtomicBool::new(false)),
        config: worker_config(&cli),
    });

    let tasks = videos
        .into_iter()
        .map(|path| VideoTask::new(path, &cli.output))
        .collect();
    let orchestrator = Orchestrator::new(
        worker,
        OrchestratorConfig::new().with_workers(Some(workers)),
    );
    let report = orchestrator.run(tasks);

    ResultAggregator::new(results).publish(report, &cli.output)?;
    Ok(())
}

fn build_model_provider(
    cli: &Cli,
    workers: usize,
) -> Result<OnnxModelProvider, Box<dyn std::error::Error>> {
    log::info!("Resolving person model: {}", cli.person_model);
    let person_model = model_resolver::resolve(
        &ModelSource::from_arg(&cli.person_model, Some(PERSON_MODEL_URL)),
        None,
        Some(Box::new(download_progress)),
    )?;
    log::info!("Resolving garment model: {}", cli.garment_model);
    let garment_model = model_resolver::resolve(
        &ModelSource::from_arg(&cli.garment_model, None),
        None,
        None,
    )?;

    Ok(OnnxModelProvider::new(
        &person_model,
        &garment_model,
        cli.garment_labels.as_deref(),
        intra_threads_per_worker(workers),
    )?)
}

fn worker_config(cli: &Cli) -> WorkerConfig {
    WorkerConfig {
        stride: cli.stride,
        person_confidence: cli.person_confidence,
        garment_confidence: cli.garment_confidence,
        min_crop_side: cli.min_crop,
        issuance: if cli.eager_numbering {
            IssuancePolicy::BeforeSizeCheck
        } else {
            IssuancePolicy::AfterSizeCheck
        },
        ..WorkerConfig::default()
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.stride == 0 {
        return Err("Stride must be at least 1".into());
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&cli.person_confidence) {
        return Err(format!(
            "Person confidence must be between 0.0 and 1.0, got {}",
            cli.person_confidence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.garment_confidence) {
        return Err(format!(
            "Garment confidence must be between 0.0 and 1.0, got {}",
            cli.garment_confidence
        )
        .into());
    }
    if let Some(labels) = &cli.garment_labels {
        if !labels.is_file() {
            return Err(format!("Garment labels not found: {}", labels.display()).into());
        }
    }
    if cli.output.is_file() {
        return Err(format!("Output is a file: {}", cli.output.display()).into());
    }
    Ok(())
}

/// Video files directly inside `dir`, sorted by name.
fn discover_videos(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut videos: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_video(path))
        .collect();
    videos.sort();
    Ok(videos)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading person detection model... {pct}%");
    } else {
        eprint!("\rDownloading person detection model... {downloaded} bytes");
    }
}
