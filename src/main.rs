mod error;
mod matte;
mod output;
mod pipeline;
mod segmentation;
mod source;

use anyhow::{bail, Context, Result};
use clap::Parser;
use matte::{LearnedMatte, MatteStrategy, ThresholdMatte, DEFAULT_CUTOFF};
use pipeline::{Job, PipelineDriver};
use source::{FrameSampler, VideoBackend, MAX_SAMPLES};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video to sample and the directory its frames go to, as VIDEO=DIR.
    /// Repeat to process several videos in order.
    #[arg(short, long = "job", value_name = "VIDEO=DIR", value_parser = parse_job, required = true)]
    jobs: Vec<(PathBuf, PathBuf)>,

    /// Background removal strategy
    #[arg(short, long, value_enum, default_value_t = MatteStrategy::Threshold)]
    strategy: MatteStrategy,

    /// Maximum number of frames sampled per video
    #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..=MAX_SAMPLES as i64))]
    max_frames: u32,

    /// Luminance below which the threshold strategy treats a pixel as backdrop
    #[arg(long, default_value_t = DEFAULT_CUTOFF)]
    cutoff: u8,

    /// Path to the background removal model (ONNX file).
    /// Required by the learned strategy.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_job(value: &str) -> Result<(PathBuf, PathBuf), String> {
    let (video, dir) = value
        .split_once('=')
        .ok_or_else(|| format!("expected VIDEO=DIR, got `{value}`"))?;
    if video.is_empty() || dir.is_empty() {
        return Err(format!("expected VIDEO=DIR, got `{value}`"));
    }
    Ok((PathBuf::from(video), PathBuf::from(dir)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("spriteframes starting");
    tracing::info!("Strategy: {:?}", args.strategy);
    tracing::info!("Max frames per video: {}", args.max_frames);

    let sampler = FrameSampler::new(args.max_frames)?;
    let backend = default_backend()?;

    let mut driver = PipelineDriver::new(backend.as_ref(), sampler)
        .with_threshold(ThresholdMatte::new(args.cutoff));

    if args.strategy == MatteStrategy::Learned {
        let model_path = args
            .model
            .as_ref()
            .context("The learned strategy needs --model")?;
        tracing::info!("Loading segmentation model from {}", model_path.display());
        let model = segmentation::create_default_model(model_path)
            .context("Failed to load segmentation model")?;
        tracing::info!("Segmentation model {} loaded", model.name());
        driver = driver.with_learned(LearnedMatte::new(model));
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;
    let mut driver = driver.with_cancel_flag(cancel);

    let jobs: Vec<Job> = args
        .jobs
        .into_iter()
        .map(|(video, output_dir)| Job {
            video,
            output_dir,
            strategy: args.strategy,
        })
        .collect();

    let report = driver.run(&jobs);

    for video in &report.videos {
        tracing::info!(
            "{}: {} frames written, {} skipped ({:?})",
            video.video.display(),
            video.written.len(),
            video.skipped_frames,
            video.outcome
        );
    }
    tracing::info!("Total: {} frames written", report.total_written());

    let finished = report.videos.len();
    if !report.is_complete() || finished < jobs.len() {
        let failed = report
            .videos
            .iter()
            .filter(|v| v.outcome != pipeline::VideoOutcome::Completed)
            .count()
            + (jobs.len() - finished);
        bail!("{} of {} videos did not complete", failed, jobs.len());
    }

    Ok(())
}

#[cfg(feature = "opencv")]
fn default_backend() -> Result<Box<dyn VideoBackend>> {
    Ok(Box::new(source::OpenCvBackend))
}

#[cfg(not(feature = "opencv"))]
fn default_backend() -> Result<Box<dyn VideoBackend>> {
    bail!("built without a video decoder; rebuild with `--features opencv`")
}
