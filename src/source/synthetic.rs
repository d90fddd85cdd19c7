//! In-memory video doubles for tests

use super::{ChannelOrder, Frame, VideoBackend, VideoSource};
use anyhow::{anyhow, bail, Result};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A video whose n-th frame is a flat BGR frame with every byte set to `n % 256`
pub struct SyntheticSource {
    pub width: u32,
    pub height: u32,
    /// Frames the stream actually contains
    pub length: u64,
    /// Frame count reported by the metadata
    pub reported_count: u64,
    pub fps: f64,
    /// Fail decoding at this ordinal instead of returning a frame
    pub fail_at: Option<u64>,
    pub position: u64,
    pub decoded: Rc<Cell<u64>>,
    pub releases: Rc<Cell<u32>>,
}

impl SyntheticSource {
    pub fn new(length: u64) -> Self {
        Self {
            width: 4,
            height: 2,
            length,
            reported_count: length,
            fps: 30.0,
            fail_at: None,
            position: 0,
            decoded: Rc::new(Cell::new(0)),
            releases: Rc::new(Cell::new(0)),
        }
    }

    pub fn reporting(mut self, reported_count: u64) -> Self {
        self.reported_count = reported_count;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn failing_at(mut self, ordinal: u64) -> Self {
        self.fail_at = Some(ordinal);
        self
    }

    /// Value every byte of the frame at `ordinal` carries
    pub fn fill_value(ordinal: u64) -> u8 {
        (ordinal % 256) as u8
    }
}

impl VideoSource for SyntheticSource {
    fn frame_count(&self) -> u64 {
        self.reported_count
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.fail_at == Some(self.position) {
            bail!("corrupt packet at {}", self.position);
        }
        if self.position >= self.length {
            return Ok(None);
        }
        let value = Self::fill_value(self.position);
        self.position += 1;
        self.decoded.set(self.decoded.get() + 1);
        let data = vec![value; (self.width * self.height * 3) as usize];
        Frame::new(self.width, self.height, data, ChannelOrder::Bgr).map(Some)
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

/// Opens synthetic videos by path; unknown paths fail to open
#[derive(Default)]
pub struct SyntheticBackend {
    videos: HashMap<PathBuf, (u64, u64)>,
    pub releases: Rc<Cell<u32>>,
}

impl SyntheticBackend {
    pub fn with_video(mut self, path: impl Into<PathBuf>, length: u64, reported_count: u64) -> Self {
        self.videos.insert(path.into(), (length, reported_count));
        self
    }
}

impl VideoBackend for SyntheticBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        let (length, reported) = self
            .videos
            .get(path)
            .copied()
            .ok_or_else(|| anyhow!("no such file"))?;
        let mut source = SyntheticSource::new(length).reporting(reported);
        source.releases = Rc::clone(&self.releases);
        Ok(Box::new(source))
    }
}
