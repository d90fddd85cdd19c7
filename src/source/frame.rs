use anyhow::{anyhow, Result};
use image::RgbImage;

/// Order of the three colour channels in a decoded buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue, green, red. What OpenCV decoders hand out.
    Bgr,
    /// Red, green, blue. What PNG files and most models expect.
    Rgb,
}

/// A decoded 3-channel raster, tagged with its channel order.
///
/// The pixel storage reuses `RgbImage` for its row-major layout, but the
/// bytes are only red-green-blue when the frame is tagged `Rgb`.
#[derive(Debug, Clone)]
pub struct Frame {
    buffer: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    /// Wrap a packed 3-byte-per-pixel buffer
    pub fn new(width: u32, height: u32, data: Vec<u8>, order: ChannelOrder) -> Result<Self> {
        let len = data.len();
        let buffer = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            anyhow!(
                "{} bytes do not hold a {}x{} 3-channel frame",
                len,
                width,
                height
            )
        })?;
        Ok(Self { buffer, order })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// The pixel at `(x, y)` as `[r, g, b]` regardless of storage order
    pub fn rgb_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let [c0, c1, c2] = self.buffer.get_pixel(x, y).0;
        match self.order {
            ChannelOrder::Rgb => [c0, c1, c2],
            ChannelOrder::Bgr => [c2, c1, c0],
        }
    }

    /// Iterate pixels as `[r, g, b]` regardless of storage order
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        let order = self.order;
        self.buffer.pixels().map(move |p| match order {
            ChannelOrder::Rgb => p.0,
            ChannelOrder::Bgr => [p.0[2], p.0[1], p.0[0]],
        })
    }

    /// Reorder the channels in place
    pub fn into_order(mut self, order: ChannelOrder) -> Self {
        if self.order != order {
            for pixel in self.buffer.pixels_mut() {
                pixel.0.swap(0, 2);
            }
            self.order = order;
        }
        self
    }

    /// Hand out the raw buffer in the requested channel order
    pub fn into_buffer(self, order: ChannelOrder) -> RgbImage {
        self.into_order(order).buffer
    }
}
