use std::path::PathBuf;
use thiserror::Error;

/// Failures of the extraction pipeline, each contained at the smallest scope
/// it affects: a frame, then a video.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The video could not be opened. The video is skipped.
    #[error("cannot open video {}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The decoder failed mid-stream. Sampling of the video stops.
    #[error("decoding failed after frame ordinal {ordinal}")]
    Decode {
        ordinal: u64,
        #[source]
        source: anyhow::Error,
    },

    /// A matte stage could not process one frame. The frame is skipped.
    #[error("matting failed for frame ordinal {ordinal}")]
    MatteFailure {
        ordinal: u64,
        #[source]
        source: anyhow::Error,
    },

    /// A frame could not be persisted. The rest of the video is abandoned.
    #[error("cannot write {}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
