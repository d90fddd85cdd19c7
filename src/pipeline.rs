use crate::error::ExtractError;
use crate::matte::{LearnedMatte, Matte, MatteStrategy, ThresholdMatte};
use crate::output::{FrameSink, FrameWriter, OutputArtifact};
use crate::source::{FrameSampler, VideoBackend};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One video to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub video: PathBuf,
    pub output_dir: PathBuf,
    pub strategy: MatteStrategy,
}

/// How a video's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Every sampled frame was handled (some may have been skipped)
    Completed,
    /// The video could not be opened; nothing was written
    SourceUnavailable,
    /// The job asked for a strategy the driver has no matte for
    StrategyUnavailable,
    /// The decoder failed mid-stream; frames before it were written
    DecodeFailed,
    /// Writing a frame failed; the rest of the video was abandoned
    WriteFailed,
    /// Stopped by the cancellation flag
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct VideoReport {
    pub video: PathBuf,
    pub outcome: VideoOutcome,
    pub written: Vec<OutputArtifact>,
    /// Frames the sampler handed out, written or not
    pub sampled_frames: u32,
    /// Sampled frames dropped because matting failed
    pub skipped_frames: u32,
    pub error: Option<String>,
}

impl VideoReport {
    fn new(video: PathBuf) -> Self {
        Self {
            video,
            outcome: VideoOutcome::Completed,
            written: Vec::new(),
            sampled_frames: 0,
            skipped_frames: 0,
            error: None,
        }
    }

    fn fail(&mut self, outcome: VideoOutcome, error: ExtractError) {
        self.outcome = outcome;
        self.error = Some(describe(&error));
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub videos: Vec<VideoReport>,
}

impl BatchReport {
    pub fn total_written(&self) -> usize {
        self.videos.iter().map(|v| v.written.len()).sum()
    }

    /// True when every video ran to completion
    pub fn is_complete(&self) -> bool {
        self.videos
            .iter()
            .all(|v| v.outcome == VideoOutcome::Completed)
    }
}

/// Builds the sink a job's frames are written to
pub type SinkFactory = Box<dyn Fn(&Path) -> Box<dyn FrameSink>>;

/// Runs jobs one after another: sample, matte, write.
///
/// Failures stay contained: a bad frame is skipped, a bad video is reported,
/// and the batch always moves on to the next video.
pub struct PipelineDriver<'a> {
    backend: &'a dyn VideoBackend,
    sampler: FrameSampler,
    threshold: Matte,
    learned: Option<Matte>,
    sinks: SinkFactory,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(backend: &'a dyn VideoBackend, sampler: FrameSampler) -> Self {
        Self {
            backend,
            sampler,
            threshold: Matte::Threshold(ThresholdMatte::default()),
            learned: None,
            sinks: Box::new(|dir: &Path| Box::new(FrameWriter::new(dir)) as Box<dyn FrameSink>),
            cancel: None,
        }
    }

    /// Write frames somewhere other than PNG files in the job's directory
    pub fn with_sinks(mut self, sinks: SinkFactory) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn with_threshold(mut self, matte: ThresholdMatte) -> Self {
        self.threshold = Matte::Threshold(matte);
        self
    }

    pub fn with_learned(mut self, matte: LearnedMatte) -> Self {
        self.learned = Some(Matte::Learned(matte));
        self
    }

    /// Poll `flag` between frames and stop once it is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn run(&mut self, jobs: &[Job]) -> BatchReport {
        let mut batch = BatchReport::default();

        for job in jobs {
            if self.cancelled() {
                tracing::warn!("Cancelled, not starting {}", job.video.display());
                break;
            }

            let report = self.run_job(job);
            match report.outcome {
                VideoOutcome::Completed => tracing::info!(
                    "Done! {} frames written for {}",
                    report.written.len(),
                    job.video.display()
                ),
                outcome => tracing::warn!(
                    "{} ended early ({:?}) with {} frames written",
                    job.video.display(),
                    outcome,
                    report.written.len()
                ),
            }
            batch.videos.push(report);
        }

        tracing::info!(
            "All videos processed: {} frames written across {} videos",
            batch.total_written(),
            batch.videos.len()
        );
        batch
    }

    pub fn run_job(&mut self, job: &Job) -> VideoReport {
        let mut report = VideoReport::new(job.video.clone());
        tracing::info!("Processing video: {}", job.video.display());

        let cancel = self.cancel.clone();
        let matte = match job.strategy {
            MatteStrategy::Threshold => Some(&mut self.threshold),
            MatteStrategy::Learned => self.learned.as_mut(),
        };
        let Some(matte) = matte else {
            let error = ExtractError::InvalidConfig(format!(
                "no {:?} matte configured",
                job.strategy
            ));
            tracing::error!("Skipping {}: {}", job.video.display(), error);
            report.fail(VideoOutcome::StrategyUnavailable, error);
            return report;
        };

        tracing::debug!("Matte strategy: {:?}", matte.strategy());

        let mut frames = match self.sampler.open(self.backend, &job.video) {
            Ok(frames) => frames,
            Err(error) => {
                tracing::error!("Skipping video: {}", describe(&error));
                report.fail(VideoOutcome::SourceUnavailable, error);
                return report;
            }
        };

        let plan = frames.plan();
        tracing::info!(
            "Total frames: {}, FPS: {}",
            frames.total_frame_count(),
            frames.frame_rate()
        );
        tracing::info!("Sampling interval: {}", plan.interval());

        let sink = (self.sinks)(&job.output_dir);
        loop {
            let sampled = match frames.next() {
                Some(Ok(sampled)) => sampled,
                Some(Err(error)) => {
                    tracing::error!("{}", describe(&error));
                    report.fail(VideoOutcome::DecodeFailed, error);
                    break;
                }
                None => break,
            };

            // Only a run with frames left to handle counts as cancelled
            if cancel.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
                tracing::warn!("Cancelled while processing {}", job.video.display());
                report.outcome = VideoOutcome::Cancelled;
                break;
            }

            tracing::debug!(
                "Matting frame {}/{} (stream ordinal {})",
                sampled.sequence + 1,
                plan.max_frames(),
                sampled.ordinal
            );
            let image = match matte.apply(sampled.frame) {
                Ok(image) => image,
                Err(source) => {
                    let error = ExtractError::MatteFailure {
                        ordinal: sampled.ordinal,
                        source,
                    };
                    tracing::warn!("Skipping frame: {}", describe(&error));
                    report.skipped_frames += 1;
                    continue;
                }
            };

            match sink.write(sampled.sequence, &image) {
                Ok(artifact) => {
                    tracing::info!(
                        "Saved frame {}/{}: {}",
                        sampled.sequence + 1,
                        plan.max_frames(),
                        artifact.path.display()
                    );
                    report.written.push(artifact);
                }
                Err(error) => {
                    tracing::error!("Abandoning video: {}", describe(&error));
                    report.fail(VideoOutcome::WriteFailed, error);
                    break;
                }
            }
        }

        report.sampled_frames = frames.emitted();
        tracing::info!(
            "Sampled {} of at most {} frames",
            report.sampled_frames,
            plan.max_frames()
        );
        report
    }
}

/// Render an error with its chain of causes on one line
fn describe(error: &ExtractError) -> String {
    let mut text = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
