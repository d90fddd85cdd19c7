use super::FrameSink;
use crate::error::ExtractError;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A frame persisted to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    /// Size of the encoded PNG
    pub bytes: usize,
}

/// Writes matted frames as `frame_NNN.png` into one directory
#[derive(Debug, Clone)]
pub struct FrameWriter {
    output_dir: PathBuf,
}

impl FrameWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// File name for the n-th sampled frame. Sorts lexically in sample order
    /// for indices below 1000, which the sampler's cap guarantees.
    pub fn file_name(index: u32) -> String {
        format!("frame_{:03}.png", index)
    }

    pub fn path_for(&self, index: u32) -> PathBuf {
        self.output_dir.join(Self::file_name(index))
    }

}

impl FrameSink for FrameWriter {
    /// Encode `image` losslessly and write it, creating the directory if needed
    fn write(&self, index: u32, image: &RgbaImage) -> Result<OutputArtifact, ExtractError> {
        let path = self.path_for(index);
        let fail = |source: io::Error| ExtractError::WriteFailure {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.output_dir).map_err(fail)?;

        let mut encoded = Vec::new();
        PngEncoder::new(&mut encoded)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| fail(io::Error::other(e)))?;

        fs::write(&path, &encoded).map_err(fail)?;

        Ok(OutputArtifact {
            path,
            bytes: encoded.len(),
        })
    }
}
