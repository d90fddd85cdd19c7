use crate::source::ChannelOrder;
use anyhow::{ensure, Result};
use image::{GrayImage, RgbImage, RgbaImage};

/// Trait for background-removal classifiers
/// Allows swapping between different backends (U²-Net, MODNet, test stubs, ...)
pub trait SegmentationModel {
    /// Separate the subject from the background
    ///
    /// # Arguments
    /// * `image` - Input frame, channels in `input_order()`
    ///
    /// # Returns
    /// * The same frame with a computed alpha channel, same dimensions
    fn segment(&mut self, image: &RgbImage) -> Result<RgbaImage>;

    /// Channel order the model expects its input in
    fn input_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    /// Human-readable model name for logs
    fn name(&self) -> &str;
}

/// Install `mask` as the alpha channel of `image`, colour channels unchanged
pub fn cutout(image: &RgbImage, mask: &GrayImage) -> Result<RgbaImage> {
    ensure!(
        image.dimensions() == mask.dimensions(),
        "mask is {:?}, image is {:?}",
        mask.dimensions(),
        image.dimensions()
    );

    let (width, height) = image.dimensions();
    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        image::Rgba([r, g, b, mask.get_pixel(x, y)[0]])
    }))
}
