//! Horizontal multi-stop gradients.

use image::{Rgb, Rgba, RgbaImage};

use crate::blending::lerp_rgb;
use crate::config::Color;

/// Ordered color stops spread evenly across the width of a fill.
///
/// Colors are interpolated linearly between neighbouring stops; the first
/// stop sits on the leftmost column and the last on the rightmost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientSpec {
    stops: Vec<Rgb<u8>>,
}

impl GradientSpec {
    /// Build a gradient from at least two stops.
    ///
    /// Returns `None` if fewer than two stops are given.
    #[must_use]
    pub fn new(stops: Vec<Rgb<u8>>) -> Option<Self> {
        (stops.len() >= 2).then_some(Self { stops })
    }

    /// The mirrored three-stop gradient `start -> mid -> end` from configuration.
    #[must_use]
    pub fn from_colors(colors: &[Color; 3]) -> Self {
        Self {
            stops: colors.iter().map(|c| c.to_rgb()).collect(),
        }
    }

    /// The stops in order.
    #[must_use]
    pub fn stops(&self) -> &[Rgb<u8>] {
        &self.stops
    }

    /// Color of column `x` in a fill `width` columns wide.
    #[must_use]
    pub fn color_at(&self, x: u32, width: u32) -> Rgb<u8> {
        if width <= 1 {
            return self.stops[0];
        }

        let segments = self.stops.len() - 1;
        #[allow(clippy::cast_precision_loss)]
        let position = x.min(width - 1) as f32 / (width - 1) as f32 * segments as f32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let segment = (position.floor() as usize).min(segments - 1);
        #[allow(clippy::cast_precision_loss)]
        let t = position - segment as f32;

        lerp_rgb(self.stops[segment], self.stops[segment + 1], t)
    }

    /// Fill a `width`x`height` opaque image, one solid color per column.
    #[must_use]
    pub fn fill(&self, width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::new(width, height);
        for x in 0..width {
            let Rgb([r, g, b]) = self.color_at(x, width);
            for y in 0..height {
                image.put_pixel(x, y, Rgba([r, g, b, 255]));
            }
        }
        image
    }
}
