//! Pipeline configuration.
//!
//! Every constant of the watermark recipe lives here with its reference
//! default. Configurations deserialize from YAML with `#[serde(default)]`,
//! so a file only needs to name the fields it overrides:
//!
//! ```yaml
//! quality: 90
//! watermark:
//!   text: "ACME"
//!   plate:
//!     enabled: false
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque RGB color, written as `#RGB` or `#RRGGBB` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Parse `#RGB` or `#RRGGBB` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the string is not a valid hex color.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| Error::Config(format!("color {hex:?} must start with '#'")))?;
        if !digits.is_ascii() {
            return Err(Error::Config(format!("invalid hex digit in color {hex:?}")));
        }

        let channel = |s: &str| {
            u8::from_str_radix(s, 16)
                .map_err(|_| Error::Config(format!("invalid hex digit in color {hex:?}")))
        };

        match digits.len() {
            // #RGB: each digit is doubled, 0xA -> 0xAA
            3 => Ok(Self::new(
                channel(&digits[0..1])? * 17,
                channel(&digits[1..2])? * 17,
                channel(&digits[2..3])? * 17,
            )),
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            n => Err(Error::Config(format!(
                "color must be #RGB or #RRGGBB, got {n} digits in {hex:?}"
            ))),
        }
    }

    /// The color as an `image` RGB pixel.
    #[must_use]
    pub const fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// The translucent rectangle drawn behind the watermark text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    /// Draw the plate at all.
    pub enabled: bool,
    /// Fill color.
    pub color: Color,
    /// Fill opacity, 0 (invisible) to 255 (opaque).
    pub alpha: u8,
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Color::black(),
            alpha: 128,
        }
    }
}

/// Watermark text, typeface and layout constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Single-line text to stamp.
    pub text: String,
    /// TrueType/OpenType font file. `None` uses the built-in bitmap font.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Distance from the right and bottom canvas edges to the text box.
    pub margin: u32,
    /// Extra space around the text box covered by the plate.
    pub padding: u32,
    /// Horizontal gradient stops: left edge, center, right edge.
    pub gradient: [Color; 3],
    /// Backing plate settings.
    pub plate: PlateConfig,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "WATERMARK".to_string(),
            font_path: Some(PathBuf::from("assets/fonts/watermark.ttf")),
            font_size: 48.0,
            margin: 20,
            padding: 15,
            gradient: [
                Color::new(0x38, 0x06, 0x06),
                Color::new(0x92, 0x08, 0x08),
                Color::new(0x38, 0x06, 0x06),
            ],
            plate: PlateConfig::default(),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Integer upscale factor applied to both axes.
    pub scale_factor: u32,
    /// Largest accepted output width or height.
    pub max_dimension: u32,
    /// Largest accepted output pixel count.
    pub max_pixels: u64,
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Watermark recipe.
    pub watermark: WatermarkConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale_factor: 2,
            max_dimension: 16_384,
            max_pixels: 100_000_000,
            quality: 85,
            watermark: WatermarkConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the YAML is malformed or fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if its contents are invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the pipeline cannot honor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.scale_factor == 0 {
            return Err(Error::Config("scale_factor must be at least 1".to_string()));
        }
        if self.max_dimension == 0 || self.max_pixels == 0 {
            return Err(Error::Config(
                "max_dimension and max_pixels must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Error::Config(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if !(self.watermark.font_size.is_finite() && self.watermark.font_size > 0.0) {
            return Err(Error::Config(format!(
                "font_size must be positive, got {}",
                self.watermark.font_size
            )));
        }
        Ok(())
    }
}
