use super::{ChannelOrder, Frame, VideoBackend, VideoSource};
use anyhow::{anyhow, bail, Context, Result};
use opencv::{core::Mat, prelude::*, videoio};
use std::path::Path;

/// Opens video files with OpenCV's videoio module
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvBackend;

impl VideoBackend for OpenCvBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        Ok(Box::new(OpenCvSource::open(path)?))
    }
}

pub struct OpenCvSource {
    capture: videoio::VideoCapture,
    frame_count: u64,
    fps: f64,
}

impl OpenCvSource {
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Path is not valid UTF-8: {}", path.display()))?;

        tracing::debug!("Opening {} with OpenCV", path.display());

        // CAP_ANY lets OpenCV pick the backend for the container
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("Failed to create capture for {}", path.display()))?;

        if !capture.is_opened()? {
            bail!("Failed to open video file: {}", path.display());
        }

        // Some containers report a negative or fractional count
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;

        Ok(Self {
            capture,
            frame_count,
            fps,
        })
    }
}

impl VideoSource for OpenCvSource {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        if !self.capture.read(&mut mat)? || mat.empty() {
            return Ok(None);
        }

        if mat.channels() != 3 {
            bail!("Expected a 3-channel frame, got {} channels", mat.channels());
        }

        let width = mat.cols() as u32;
        let height = mat.rows() as u32;
        let data = if mat.is_continuous() {
            mat.data_bytes()?.to_vec()
        } else {
            mat.try_clone()?.data_bytes()?.to_vec()
        };

        Frame::new(width, height, data, ChannelOrder::Bgr).map(Some)
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("Failed to release video capture: {}", e);
        }
    }
}
