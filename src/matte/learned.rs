use crate::segmentation::SegmentationModel;
use crate::source::Frame;
use anyhow::{ensure, Context, Result};
use image::RgbaImage;

/// Soft-edged matte delegated to a background-removal classifier.
///
/// Much slower than [`ThresholdMatte`](super::ThresholdMatte): one model
/// inference per frame. The classifier's alpha is passed through untouched.
pub struct LearnedMatte {
    model: Box<dyn SegmentationModel>,
}

impl LearnedMatte {
    pub fn new(model: Box<dyn SegmentationModel>) -> Self {
        Self { model }
    }

    pub fn apply(&mut self, frame: Frame) -> Result<RgbaImage> {
        let _span = tracing::debug_span!("learned_matte", model = self.model.name()).entered();

        let dimensions = frame.dimensions();
        let input = frame.into_buffer(self.model.input_order());
        let output = self
            .model
            .segment(&input)
            .with_context(|| format!("{} failed to segment frame", self.model.name()))?;

        ensure!(
            output.dimensions() == dimensions,
            "{} returned a {:?} image for a {:?} frame",
            self.model.name(),
            output.dimensions(),
            dimensions
        );
        Ok(output)
    }
}
