//! Stamping the gradient text watermark onto a canvas.
//!
//! The text is rasterized once into a coverage mask, a separately colored
//! gradient layer is pasted through that mask, and the optional backing
//! plate is composited first so it never covers the glyphs.

use image::RgbaImage;

use crate::blending::{fill_rect_over, paste_through_mask, Rect};
use crate::config::WatermarkConfig;
use crate::gradient::GradientSpec;
use crate::typeface::{TextBounds, Typeface};

/// Where the watermark landed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkPlacement {
    /// Tight box of the rendered glyphs.
    pub glyph: Rect,
    /// Backing plate, present when enabled; strictly contains `glyph`.
    pub plate: Option<Rect>,
}

impl WatermarkPlacement {
    /// Anchor a `bounds`-sized text box to the bottom-right corner of a
    /// `width`x`height` canvas, `margin` pixels from both edges.
    ///
    /// With `padding`, the plate is the glyph box grown by that amount on
    /// every side. The glyph box is already origin-corrected, so the plate
    /// centers on the ink rather than on the pen position.
    #[must_use]
    pub fn anchor_bottom_right(
        width: u32,
        height: u32,
        bounds: &TextBounds,
        margin: u32,
        padding: Option<u32>,
    ) -> Self {
        let x1 = i64::from(width) - i64::from(margin);
        let y1 = i64::from(height) - i64::from(margin);
        let glyph = Rect {
            x0: x1 - i64::from(bounds.width),
            y0: y1 - i64::from(bounds.height),
            x1,
            y1,
        };
        let plate = padding.map(|p| glyph.expand(i64::from(p)));
        Self { glyph, plate }
    }

    /// Whether the glyph box lies entirely on a `width`x`height` canvas.
    #[must_use]
    pub fn fits(&self, width: u32, height: u32) -> bool {
        let canvas = Rect {
            x0: 0,
            y0: 0,
            x1: i64::from(width),
            y1: i64::from(height),
        };
        canvas.contains(&self.glyph)
    }
}

/// Stamp `config.text` onto `canvas` using `face`.
///
/// Returns the placement, or `None` when the text has no ink (empty or
/// whitespace-only), in which case the canvas is left untouched. Text
/// larger than the canvas is clipped rather than rejected.
pub fn apply(
    canvas: &mut RgbaImage,
    config: &WatermarkConfig,
    face: &dyn Typeface,
) -> Option<WatermarkPlacement> {
    let bounds = face.measure(&config.text);
    if bounds.is_empty() {
        tracing::warn!(
            text = %config.text,
            font = face.name(),
            "watermark text has no visible glyphs, skipping"
        );
        return None;
    }

    let mask = face.rasterize(&config.text, &bounds);
    let fill = GradientSpec::from_colors(&config.gradient).fill(mask.width(), mask.height());

    let (width, height) = canvas.dimensions();
    let padding = config.plate.enabled.then_some(config.padding);
    let placement =
        WatermarkPlacement::anchor_bottom_right(width, height, &bounds, config.margin, padding);
    if !placement.fits(width, height) {
        tracing::warn!(
            canvas_width = width,
            canvas_height = height,
            text_width = bounds.width,
            text_height = bounds.height,
            "watermark larger than canvas, clipping"
        );
    }

    if let Some(plate) = placement.plate {
        fill_rect_over(
            canvas,
            plate,
            config.plate.color.to_rgb(),
            config.plate.alpha,
        );
    }
    paste_through_mask(canvas, &fill, &mask, placement.glyph.x0, placement.glyph.y0);

    tracing::debug!(
        x = placement.glyph.x0,
        y = placement.glyph.y0,
        width = bounds.width,
        height = bounds.height,
        font = face.name(),
        "applied watermark"
    );
    Some(placement)
}
