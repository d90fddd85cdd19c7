use crate::source::Frame;
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Luminance below which a pixel counts as backdrop
pub const DEFAULT_CUTOFF: u8 = 30;

/// Hard-edged matte for footage shot on a clean near-black backdrop.
///
/// Pixels darker than the cutoff become fully transparent, everything else
/// fully opaque. There are no intermediate alpha values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdMatte {
    cutoff: u8,
}

impl Default for ThresholdMatte {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF)
    }
}

impl ThresholdMatte {
    pub fn new(cutoff: u8) -> Self {
        Self { cutoff }
    }

    /// BT.601 luma in 14-bit fixed point, rounded to nearest
    pub fn luminance([r, g, b]: [u8; 3]) -> u8 {
        let y = 4899 * u32::from(r) + 9617 * u32::from(g) + 1868 * u32::from(b) + (1 << 13);
        (y >> 14) as u8
    }

    /// Binary opacity mask: 0 below the cutoff, 255 at or above it
    pub fn mask(&self, frame: &Frame) -> GrayImage {
        let (width, height) = frame.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            if Self::luminance(frame.rgb_pixel(x, y)) < self.cutoff {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    /// Attach the mask as alpha; colours are written in red-green-blue order
    pub fn apply(&self, frame: &Frame) -> RgbaImage {
        let _span = tracing::debug_span!("threshold_matte").entered();

        let mask = self.mask(frame);
        let (width, height) = frame.dimensions();
        let mut out = RgbaImage::new(width, height);
        for ((dst, [r, g, b]), Luma([alpha])) in out
            .pixels_mut()
            .zip(frame.rgb_pixels())
            .zip(mask.pixels().copied())
        {
            *dst = Rgba([r, g, b, alpha]);
        }
        out
    }
}
