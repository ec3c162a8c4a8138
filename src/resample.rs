//! Integer-factor upscaling with a Lanczos kernel.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{Error, Result};

/// Upper bounds on the size of a resampled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionLimits {
    /// Largest accepted width or height.
    pub max_dimension: u32,
    /// Largest accepted `width * height`.
    pub max_pixels: u64,
}

/// Compute the `(width, height)` of `image` scaled by `factor`, checking limits.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if the result would be empty or
/// exceed `limits`.
pub fn scaled_dimensions(
    width: u32,
    height: u32,
    factor: u32,
    limits: DimensionLimits,
) -> Result<(u32, u32)> {
    let w = u64::from(width) * u64::from(factor);
    let h = u64::from(height) * u64::from(factor);
    let reject = |reason: String| Error::InvalidDimensions {
        width: w,
        height: h,
        reason,
    };

    if w == 0 || h == 0 {
        return Err(reject("dimensions must be positive".to_string()));
    }
    if w > u64::from(limits.max_dimension) || h > u64::from(limits.max_dimension) {
        return Err(reject(format!(
            "exceeds maximum dimension {}",
            limits.max_dimension
        )));
    }
    if w * h > limits.max_pixels {
        return Err(reject(format!("exceeds maximum of {} pixels", limits.max_pixels)));
    }

    // Both fit in u32 because they are bounded by max_dimension.
    #[allow(clippy::cast_possible_truncation)]
    Ok((w as u32, h as u32))
}

/// Return a copy of `image` scaled by `factor` on both axes.
///
/// A factor of 1 returns an unfiltered copy.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if the result would be empty or
/// exceed `limits`.
pub fn upscale(image: &RgbaImage, factor: u32, limits: DimensionLimits) -> Result<RgbaImage> {
    let (width, height) = scaled_dimensions(image.width(), image.height(), factor, limits)?;
    if factor == 1 {
        return Ok(image.clone());
    }

    let scaled = imageops::resize(image, width, height, FilterType::Lanczos3);
    tracing::debug!(width, height, factor, "upscaled canvas");
    Ok(scaled)
}
