mod learned;
mod threshold;

pub use learned::LearnedMatte;
pub use threshold::{ThresholdMatte, DEFAULT_CUTOFF};


use crate::source::Frame;
use anyhow::Result;
use image::RgbaImage;

/// Which matting strategy a job uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MatteStrategy {
    /// Fast, hard-edged luminance cutoff for near-black backdrops
    Threshold,
    /// Slow, soft-edged background-removal model
    Learned,
}

/// A configured matte stage
pub enum Matte {
    Threshold(ThresholdMatte),
    Learned(LearnedMatte),
}

impl Matte {
    pub fn strategy(&self) -> MatteStrategy {
        match self {
            Self::Threshold(_) => MatteStrategy::Threshold,
            Self::Learned(_) => MatteStrategy::Learned,
        }
    }

    /// Turn a decoded colour frame into an RGBA frame of the same size
    pub fn apply(&mut self, frame: Frame) -> Result<RgbaImage> {
        match self {
            Self::Threshold(matte) => Ok(matte.apply(&frame)),
            Self::Learned(matte) => matte.apply(frame),
        }
    }
}
