use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use scenetrack::{
    DirectoryFrames, DirectorySink, JsonFileStore, TrackerBackend, TrackerConfig,
    TrackingPipeline, TrajectoryRecorder, parse_annotations_file,
};

/// Track annotated objects across the extracted frames of a scene.
#[derive(Parser, Debug)]
#[command(name = "scenetrack", version, about)]
struct Args {
    /// Directory of extracted frames, ordered by file name
    #[arg(long)]
    frames: PathBuf,

    /// JSON file with `[{"id", "x", "y", "width", "height"}]` boxes on frame 0
    #[arg(long)]
    annotations: PathBuf,

    /// Key under which the trajectory is stored
    #[arg(long)]
    video_id: String,

    /// Tracker configuration JSON; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured backend (correlation, predictive)
    #[arg(long)]
    backend: Option<TrackerBackend>,

    /// Override the number of per-frame worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Directory holding one trajectory document per video
    #[arg(long, default_value = "results")]
    store: PathBuf,

    /// Write overlay frames for the review video here
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 30.0)]
    source_fps: f64,

    /// Output rate of the review video
    #[arg(long, default_value_t = 1.0)]
    target_fps: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TrackerConfig::default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let annotations = parse_annotations_file(&args.annotations)?;
    let mut source = DirectoryFrames::open(&args.frames)
        .with_context(|| format!("opening frames in {}", args.frames.display()))?;
    let store = JsonFileStore::open(&args.store)?;
    let mut pipeline = TrackingPipeline::new(store, config);

    let result = match &args.overlay_dir {
        Some(dir) => {
            let sink = DirectorySink::create(dir)?;
            let mut recorder = TrajectoryRecorder::with_rates(sink, args.source_fps, args.target_fps);
            let result = pipeline.track(&args.video_id, &mut source, &annotations, &mut recorder)?;
            recorder.finish()?;
            result
        }
        None => pipeline.track(&args.video_id, &mut source, &annotations, &mut ())?,
    };

    println!("{}", result.to_json()?);
    Ok(())
}
