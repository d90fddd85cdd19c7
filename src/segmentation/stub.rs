//! Deterministic classifier doubles for tests

use super::{cutout, SegmentationModel};
use crate::source::ChannelOrder;
use anyhow::{bail, Result};
use image::{GrayImage, RgbImage, RgbaImage};
use std::cell::RefCell;
use std::rc::Rc;

/// Classifier whose alpha is a horizontal ramp from 0 to 255
pub struct GradientModel {
    pub order: ChannelOrder,
    /// Zero-based calls that fail instead of segmenting
    pub fail_calls: Vec<usize>,
    pub calls: usize,
    /// Every image the model was handed
    pub seen: Rc<RefCell<Vec<RgbImage>>>,
}

impl GradientModel {
    pub fn new() -> Self {
        Self {
            order: ChannelOrder::Rgb,
            fail_calls: Vec::new(),
            calls: 0,
            seen: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn ramp(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            image::Luma([(x * 255 / width.saturating_sub(1).max(1)) as u8])
        })
    }
}

impl SegmentationModel for GradientModel {
    fn segment(&mut self, image: &RgbImage) -> Result<RgbaImage> {
        let call = self.calls;
        self.calls += 1;
        self.seen.borrow_mut().push(image.clone());
        if self.fail_calls.contains(&call) {
            bail!("inference blew up");
        }
        let (width, height) = image.dimensions();
        cutout(image, &Self::ramp(width, height))
    }

    fn input_order(&self) -> ChannelOrder {
        self.order
    }

    fn name(&self) -> &str {
        "gradient"
    }
}
