mod png_writer;

pub use png_writer::{FrameWriter, OutputArtifact};

use crate::error::ExtractError;
use image::RgbaImage;

/// Trait for destinations of matted frames
pub trait FrameSink {
    /// Persist the frame sampled at position `index`
    fn write(&self, index: u32, image: &RgbaImage) -> Result<OutputArtifact, ExtractError>;
}
