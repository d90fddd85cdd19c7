mod frame;
#[cfg(feature = "opencv")]
mod opencv_source;
mod sampler;
#[cfg(test)]
pub mod synthetic;

pub use frame::{ChannelOrder, Frame};
#[cfg(feature = "opencv")]
pub use opencv_source::OpenCvBackend;
pub use sampler::{FrameSampler, MAX_SAMPLES};

use anyhow::Result;
use std::path::Path;

/// Trait for an opened video stream
pub trait VideoSource {
    /// Total frame count reported by the container. 0 when unknown,
    /// and not necessarily accurate.
    fn frame_count(&self) -> u64;

    /// Frame rate reported by the container (informational only)
    fn frame_rate(&self) -> f64;

    /// Decode the next frame in stream order.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying decoder handle
    fn release(&mut self);
}

/// Trait for decoders able to open a video file
pub trait VideoBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>>;
}
