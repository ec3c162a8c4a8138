//! Color math shared by the watermark stages.
//!
//! Two compositing operations are used:
//! - Porter-Duff "over" for a flat translucent layer:
//!   `out_a = src_a + dst_a * (1 - src_a)`,
//!   `out_c = (src_c * src_a + dst_c * dst_a * (1 - src_a)) / out_a`
//! - Stencilled paste through a coverage mask:
//!   `out = dst + (src - dst) * mask / 255`, applied to all four channels.

use image::{GrayImage, Rgb, Rgba, RgbaImage};

/// An axis-aligned rectangle in canvas coordinates, `x0..x1` by `y0..y1`.
///
/// Coordinates are signed so a rectangle may hang off the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x0: i64,
    /// Top edge (inclusive).
    pub y0: i64,
    /// Right edge (exclusive).
    pub x1: i64,
    /// Bottom edge (exclusive).
    pub y1: i64,
}

impl Rect {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }

    /// Grow the rectangle by `amount` on every side.
    #[must_use]
    pub fn expand(&self, amount: i64) -> Self {
        Self {
            x0: self.x0 - amount,
            y0: self.y0 - amount,
            x1: self.x1 + amount,
            y1: self.y1 + amount,
        }
    }

    /// Whether `other` lies inside `self`, edges included.
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Intersect with a `width`x`height` canvas.
    ///
    /// Returns the visible `(x0, y0, x1, y1)` or `None` when nothing is visible.
    #[must_use]
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x0.clamp(0, i64::from(width));
        let y0 = self.y0.clamp(0, i64::from(height));
        let x1 = self.x1.clamp(0, i64::from(width));
        let y1 = self.y1.clamp(0, i64::from(height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        // Clamped into u32 range above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let visible = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);
        Some(visible)
    }
}

/// Interpolate one channel, `t` in `[0, 1]`.
#[must_use]
pub fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    let v = f32::from(a) + (f32::from(b) - f32::from(a)) * t.clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let v = v.round().clamp(0.0, 255.0) as u8;
    v
}

/// Interpolate two RGB colors, `t` in `[0, 1]`.
#[must_use]
pub fn lerp_rgb(a: Rgb<u8>, b: Rgb<u8>, t: f32) -> Rgb<u8> {
    Rgb([
        lerp_channel(a[0], b[0], t),
        lerp_channel(a[1], b[1], t),
        lerp_channel(a[2], b[2], t),
    ])
}

/// Composite `src` over `dst` with straight (non-premultiplied) alpha.
#[must_use]
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| -> u8 {
        let c = (f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = c.round().clamp(0.0, 255.0) as u8;
        c
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        alpha,
    ])
}

/// Composite a flat `color` rectangle at opacity `alpha` over `canvas`.
///
/// Equivalent to laying a canvas-sized transparent layer holding only the
/// filled rectangle over the image. The part of `rect` outside the canvas
/// is ignored.
pub fn fill_rect_over(canvas: &mut RgbaImage, rect: Rect, color: Rgb<u8>, alpha: u8) {
    let Some((x0, y0, x1, y1)) = rect.clip(canvas.width(), canvas.height()) else {
        return;
    };
    if alpha == 0 {
        return;
    }

    let src = Rgba([color[0], color[1], color[2], alpha]);
    for y in y0..y1 {
        for x in x0..x1 {
            let px = canvas.get_pixel_mut(x, y);
            *px = blend_over(*px, src);
        }
    }
}

/// Paste `src` onto `canvas` with its top-left corner at `(x, y)`, using
/// `mask` as a per-pixel stencil.
///
/// `src` and `mask` must have the same dimensions. Pixels where the mask is
/// zero are left untouched, and the part hanging off the canvas is clipped.
pub fn paste_through_mask(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    mask: &GrayImage,
    x: i64,
    y: i64,
) {
    debug_assert_eq!(src.dimensions(), mask.dimensions());

    let area = Rect {
        x0: x,
        y0: y,
        x1: x + i64::from(mask.width()),
        y1: y + i64::from(mask.height()),
    };
    let Some((cx0, cy0, cx1, cy1)) = area.clip(canvas.width(), canvas.height()) else {
        return;
    };

    for cy in cy0..cy1 {
        for cx in cx0..cx1 {
            // Inside the clipped area, so the offsets are non-negative.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (mx, my) = ((i64::from(cx) - x) as u32, (i64::from(cy) - y) as u32);
            let coverage = mask.get_pixel(mx, my)[0];
            if coverage == 0 {
                continue;
            }

            let t = f32::from(coverage) / 255.0;
            let from = *src.get_pixel(mx, my);
            let px = canvas.get_pixel_mut(cx, cy);
            for ch in 0..4 {
                px[ch] = lerp_channel(px[ch], from[ch], t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn lerp_hits_endpoints_exactly() {
        assert_eq!(lerp_channel(56, 146, 0.0), 56);
        assert_eq!(lerp_channel(56, 146, 1.0), 146);
        assert_eq!(lerp_channel(0, 255, 0.5), 128);
        assert_eq!(lerp_channel(10, 20, 7.0), 20);
    }

    #[test]
    fn over_with_half_black_halves_opaque_color() {
        let out = blend_over(Rgba([200, 100, 50, 255]), Rgba([0, 0, 0, 128]));
        assert_eq!(out[3], 255);
        for (ch, orig) in [200u8, 100, 50].into_iter().enumerate() {
            let expected = f32::from(orig) * (1.0 - 128.0 / 255.0);
            assert!((f32::from(out[ch]) - expected).abs() <= 1.0);
        }
    }

    #[test]
    fn over_with_opaque_source_replaces_pixel() {
        let out = blend_over(Rgba([1, 2, 3, 255]), Rgba([9, 8, 7, 255]));
        assert_eq!(out, Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn over_onto_transparent_keeps_source() {
        let out = blend_over(Rgba([0, 0, 0, 0]), Rgba([90, 60, 30, 128]));
        assert_eq!(out, Rgba([90, 60, 30, 128]));
        assert_eq!(
            blend_over(Rgba([0, 0, 0, 0]), Rgba([5, 5, 5, 0])),
            Rgba([0, 0, 0, 0])
        );
    }

    #[test]
    fn fill_rect_only_touches_the_rectangle() {
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let rect = Rect {
            x0: 2,
            y0: 3,
            x1: 5,
            y1: 6,
        };
        fill_rect_over(&mut canvas, rect, Rgb([0, 0, 0]), 128);

        for (x, y, px) in canvas.enumerate_pixels() {
            let inside = (2..5).contains(&x) && (3..6).contains(&y);
            if inside {
                assert!(px[0] < 200, "({x},{y}) should be darkened");
            } else {
                assert_eq!(*px, Rgba([255, 255, 255, 255]), "({x},{y}) changed");
            }
        }
    }

    #[test]
    fn fill_rect_off_canvas_is_clipped() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let rect = Rect {
            x0: -10,
            y0: -10,
            x1: 100,
            y1: 100,
        };
        fill_rect_over(&mut canvas, rect, Rgb([0, 0, 0]), 255);
        assert!(canvas.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));

        let far = Rect {
            x0: 50,
            y0: 50,
            x1: 60,
            y1: 60,
        };
        fill_rect_over(&mut canvas, far, Rgb([255, 0, 0]), 255);
        assert!(canvas.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn paste_is_limited_to_mask_coverage() {
        let mut canvas = RgbaImage::from_pixel(6, 6, Rgba([10, 20, 30, 255]));
        let src = RgbaImage::from_pixel(3, 3, Rgba([200, 0, 0, 255]));
        let mut mask = GrayImage::new(3, 3);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 1, Luma([128]));

        paste_through_mask(&mut canvas, &src, &mask, 2, 2);

        assert_eq!(*canvas.get_pixel(2, 2), Rgba([200, 0, 0, 255]));
        let edge = canvas.get_pixel(3, 3);
        assert!(edge[0] > 10 && edge[0] < 200);
        for (x, y, px) in canvas.enumerate_pixels() {
            if (x, y) != (2, 2) && (x, y) != (3, 3) {
                assert_eq!(*px, Rgba([10, 20, 30, 255]), "({x},{y}) changed");
            }
        }
    }

    #[test]
    fn paste_clips_negative_offsets() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let mask = GrayImage::from_pixel(4, 4, Luma([255]));

        paste_through_mask(&mut canvas, &src, &mask, -3, -3);

        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rect_geometry() {
        let r = Rect {
            x0: 10,
            y0: 20,
            x1: 30,
            y1: 25,
        };
        assert_eq!((r.width(), r.height()), (20, 5));
        let grown = r.expand(15);
        assert_eq!(grown, Rect { x0: -5, y0: 5, x1: 45, y1: 40 });
        assert!(grown.contains(&r));
        assert!(!r.contains(&grown));
        assert_eq!(grown.clip(40, 100), Some((0, 5, 40, 40)));
    }
}
