//! Rendering text into coverage masks.
//!
//! A [`Typeface`] only has to report where its ink lands relative to the pen
//! origin; measuring and rasterizing are derived from that. Two variants are
//! provided: [`TrueTypeFace`] for font files, and [`BitmapFace`], a built-in
//! 8x8 bitmap font that needs no resources and is used whenever a font file
//! is missing or unreadable.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{GrayImage, Luma};

/// Single-channel text coverage: 0 is background, 255 is solid ink.
pub type GlyphMask = GrayImage;

/// Tight ink bounding box of a string, relative to the pen origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    /// Horizontal offset of the box from the pen origin (may be negative).
    pub left: i32,
    /// Vertical offset of the box from the pen origin (may be negative).
    pub top: i32,
    /// Box width in pixels.
    pub width: u32,
    /// Box height in pixels.
    pub height: u32,
}

impl TextBounds {
    /// Whether the box covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Something that can lay a line of text out as anti-aliased coverage.
pub trait Typeface: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Call `plot(x, y, coverage)` for every inked pixel of `text`, with the
    /// pen at the origin. Coverage is in `[0, 1]`.
    fn trace(&self, text: &str, plot: &mut dyn FnMut(i32, i32, f32));

    /// Compute the tight ink bounding box of `text`.
    fn measure(&self, text: &str) -> TextBounds {
        let mut min = (i32::MAX, i32::MAX);
        let mut max = (i32::MIN, i32::MIN);
        self.trace(text, &mut |x, y, coverage| {
            if coverage > 0.0 {
                min = (min.0.min(x), min.1.min(y));
                max = (max.0.max(x), max.1.max(y));
            }
        });

        if min.0 > max.0 {
            return TextBounds {
                left: 0,
                top: 0,
                width: 0,
                height: 0,
            };
        }

        #[allow(clippy::cast_sign_loss)]
        let (width, height) = ((max.0 - min.0 + 1) as u32, (max.1 - min.1 + 1) as u32);
        TextBounds {
            left: min.0,
            top: min.1,
            width,
            height,
        }
    }

    /// Rasterize `text` into a mask exactly the size of `bounds`, shifted so
    /// the ink starts at `(0, 0)`.
    fn rasterize(&self, text: &str, bounds: &TextBounds) -> GlyphMask {
        let mut mask = GlyphMask::new(bounds.width, bounds.height);
        self.trace(text, &mut |x, y, coverage| {
            let (Ok(mx), Ok(my)) = (
                u32::try_from(x - bounds.left),
                u32::try_from(y - bounds.top),
            ) else {
                return;
            };
            if mx >= mask.width() || my >= mask.height() {
                return;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            let px = mask.get_pixel_mut(mx, my);
            // Overlapping glyphs keep the stronger coverage.
            if value > px[0] {
                *px = Luma([value]);
            }
        });
        mask
    }
}

/// A scalable outline font loaded from a TrueType/OpenType file.
pub struct TrueTypeFace {
    font: FontVec,
    scale: PxScale,
    name: String,
}

impl TrueTypeFace {
    /// Load a font file at `size` pixels.
    ///
    /// Returns `None` if the file cannot be read or parsed.
    #[must_use]
    pub fn load(path: &Path, size: f32) -> Option<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "font file unavailable");
                return None;
            }
        };
        Self::from_bytes(data, size, path.display().to_string())
    }

    /// Parse font data held in memory.
    ///
    /// Returns `None` if the data is not a valid font.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>, size: f32, name: String) -> Option<Self> {
        match FontVec::try_from_vec(data) {
            Ok(font) => Some(Self {
                font,
                scale: PxScale::from(size),
                name,
            }),
            Err(e) => {
                tracing::warn!(font = %name, error = %e, "font data invalid");
                None
            }
        }
    }
}

impl Typeface for TrueTypeFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn trace(&self, text: &str, plot: &mut dyn FnMut(i32, i32, f32)) {
        let scaled = self.font.as_scaled(self.scale);
        // Baseline sits one ascent below the pen, like a top-left anchored draw.
        let baseline = scaled.ascent();
        let mut cursor = 0.0f32;
        let mut prev = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(self.scale, point(cursor, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                #[allow(clippy::cast_possible_truncation)]
                let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
                #[allow(clippy::cast_possible_wrap)]
                outlined.draw(|x, y, coverage| plot(ox + x as i32, oy + y as i32, coverage));
            }
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
    }
}

/// The built-in 8x8 bitmap font, enlarged by an integer factor.
#[derive(Debug, Clone, Copy)]
pub struct BitmapFace {
    scale: u32,
}

impl BitmapFace {
    /// Native glyph cell size in pixels.
    pub const CELL: u32 = 8;

    /// Pick the integer enlargement closest to `size` pixels.
    #[must_use]
    pub fn new(size: f32) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scale = (size / 8.0).round().max(1.0) as u32;
        Self { scale }
    }

    /// Integer enlargement factor.
    #[must_use]
    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl Typeface for BitmapFace {
    fn name(&self) -> &str {
        "builtin-8x8"
    }

    #[allow(clippy::cast_possible_wrap)]
    fn trace(&self, text: &str, plot: &mut dyn FnMut(i32, i32, f32)) {
        let scale = self.scale as i32;
        let advance = (Self::CELL * self.scale) as i32;

        for (index, c) in text.chars().enumerate() {
            let Some(rows) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
                continue;
            };
            let origin = index as i32 * advance;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..8 {
                    // Bit 0 is the leftmost column.
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let x0 = origin + col * scale;
                    let y0 = row as i32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            plot(x0 + dx, y0 + dy, 1.0);
                        }
                    }
                }
            }
        }
    }
}

/// Resolve the configured typeface, falling back to [`BitmapFace`].
///
/// Never fails: a missing or broken font file only costs legibility.
#[must_use]
pub fn resolve(path: Option<&Path>, size: f32) -> Box<dyn Typeface> {
    if let Some(path) = path {
        if let Some(face) = TrueTypeFace::load(path, size) {
            tracing::debug!(font = face.name(), size, "loaded font");
            return Box::new(face);
        }
        tracing::warn!(path = %path.display(), "falling back to built-in bitmap font");
    }
    Box::new(BitmapFace::new(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SERIF_ITALIC: &[u8] = include_bytes!("../tests/fonts/DejaVuSerif-Italic.ttf");

    /// Inks a fixed pattern left of and above the pen origin.
    struct OffsetFace;

    impl Typeface for OffsetFace {
        fn name(&self) -> &str {
            "offset"
        }

        fn trace(&self, _text: &str, plot: &mut dyn FnMut(i32, i32, f32)) {
            plot(-10, -10, 0.0);
            plot(-3, -5, 1.0);
            plot(4, 2, 0.5);
        }
    }

    fn serif_italic(size: f32) -> TrueTypeFace {
        TrueTypeFace::from_bytes(SERIF_ITALIC.to_vec(), size, "DejaVuSerif-Italic".to_string())
            .unwrap()
    }

    fn touches_every_edge(mask: &GlyphMask) -> bool {
        let (w, h) = mask.dimensions();
        (0..h).any(|y| mask.get_pixel(0, y)[0] > 0)
            && (0..h).any(|y| mask.get_pixel(w - 1, y)[0] > 0)
            && (0..w).any(|x| mask.get_pixel(x, 0)[0] > 0)
            && (0..w).any(|x| mask.get_pixel(x, h - 1)[0] > 0)
    }

    #[test]
    fn negative_origin_is_shifted_into_mask() {
        let bounds = OffsetFace.measure("");
        assert_eq!(
            bounds,
            TextBounds {
                left: -3,
                top: -5,
                width: 8,
                height: 8,
            }
        );

        let mask = OffsetFace.rasterize("", &bounds);
        assert_eq!(mask.dimensions(), (8, 8));
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(7, 7)[0], 128);
        let inked = mask.pixels().filter(|p| p[0] > 0).count();
        assert_eq!(inked, 2);
    }

    #[test]
    fn truetype_descenders_give_negative_left_and_full_mask() {
        let face = serif_italic(48.0);
        let bounds = face.measure("fj_");
        assert!(!bounds.is_empty());
        assert!(bounds.left < 0, "{bounds:?}");

        let mask = face.rasterize("fj_", &bounds);
        assert_eq!(mask.dimensions(), (bounds.width, bounds.height));
        assert!(touches_every_edge(&mask));
        assert!(mask.pixels().any(|p| p[0] > 0 && p[0] < 255), "no anti-aliasing");
    }

    #[test]
    fn truetype_size_scales_bounds() {
        let small = serif_italic(16.0).measure("Mark");
        let large = serif_italic(64.0).measure("Mark");
        assert!(large.width > small.width * 3);
        assert!(large.height > small.height * 3);
    }

    #[test]
    fn truetype_whitespace_has_empty_bounds() {
        assert!(serif_italic(32.0).measure("  ").is_empty());
    }

    #[test]
    fn font_file_is_loaded_when_present() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SERIF_ITALIC).unwrap();
        file.flush().unwrap();

        let face = resolve(Some(file.path()), 32.0);
        assert_ne!(face.name(), "builtin-8x8");
        assert!(!face.measure("A").is_empty());
    }

    #[test]
    fn bitmap_scale_tracks_font_size() {
        assert_eq!(BitmapFace::new(8.0).scale(), 1);
        assert_eq!(BitmapFace::new(48.0).scale(), 6);
        assert_eq!(BitmapFace::new(2.0).scale(), 1);
    }

    #[test]
    fn bitmap_measure_is_tight() {
        let face = BitmapFace::new(8.0);
        // 'I' in font8x8 does not touch the left edge of its cell.
        let bounds = face.measure("I");
        assert!(!bounds.is_empty());
        assert!(bounds.width < 8);
        assert!(bounds.height <= 8);
        assert!(bounds.left > 0);
    }

    #[test]
    fn bitmap_measure_scales_with_size() {
        let small = BitmapFace::new(8.0).measure("HI");
        let large = BitmapFace::new(16.0).measure("HI");
        assert_eq!(large.width, small.width * 2);
        assert_eq!(large.height, small.height * 2);
    }

    #[test]
    fn whitespace_has_empty_bounds() {
        let face = BitmapFace::new(24.0);
        assert!(face.measure("   ").is_empty());
        assert!(face.measure("").is_empty());
    }

    #[test]
    fn unknown_characters_render_as_question_mark() {
        let face = BitmapFace::new(8.0);
        assert_eq!(face.measure("\u{2603}"), face.measure("?"));
    }

    #[test]
    fn rasterized_mask_matches_bounds_and_touches_every_edge() {
        let face = BitmapFace::new(16.0);
        let bounds = face.measure("Mark");
        let mask = face.rasterize("Mark", &bounds);

        assert_eq!(mask.dimensions(), (bounds.width, bounds.height));
        let (w, h) = mask.dimensions();
        assert!((0..h).any(|y| mask.get_pixel(0, y)[0] > 0));
        assert!((0..h).any(|y| mask.get_pixel(w - 1, y)[0] > 0));
        assert!((0..w).any(|x| mask.get_pixel(x, 0)[0] > 0));
        assert!((0..w).any(|x| mask.get_pixel(x, h - 1)[0] > 0));
    }

    #[test]
    fn missing_font_file_falls_back_to_bitmap() {
        let face = resolve(Some(Path::new("/nonexistent/font.ttf")), 32.0);
        assert_eq!(face.name(), "builtin-8x8");
    }

    #[test]
    fn corrupt_font_file_falls_back_to_bitmap() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not a font at all").unwrap();
        file.flush().unwrap();

        let face = resolve(Some(file.path()), 32.0);
        assert_eq!(face.name(), "builtin-8x8");
    }

    #[test]
    fn no_font_path_uses_bitmap() {
        assert_eq!(resolve(None, 12.0).name(), "builtin-8x8");
    }
}
