//! Decoding input buffers and encoding the final artifact.

use std::io::Cursor;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// MIME type of every artifact this crate produces.
pub const CONTENT_TYPE: &str = "image/jpeg";

/// File extension matching [`CONTENT_TYPE`].
pub const FILE_EXTENSION: &str = "jpg";

/// A finished, compressed output image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    bytes: Vec<u8>,
    content_type: &'static str,
}

impl EncodedArtifact {
    /// The encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type of [`bytes`](Self::bytes).
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Consume the artifact, returning the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Read the `(width, height)` of an encoded image from its header only.
///
/// No pixel data is decoded, so this is cheap even for huge images.
///
/// # Errors
///
/// Returns [`Error::Decode`] if `bytes` is empty or the header is not a
/// recognized image format.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.is_empty() {
        return Err(Error::Decode("input buffer is empty".to_string()));
    }

    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| Error::Decode(e.to_string()))
}

/// Decode an encoded raster image into RGBA pixels.
///
/// The container format is sniffed from the content; images without an
/// alpha channel come back fully opaque.
///
/// # Errors
///
/// Returns [`Error::Decode`] if `bytes` is empty or not a well-formed image.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(Error::Decode("input buffer is empty".to_string()));
    }

    let image = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    let rgba = image.into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(Error::Decode(format!(
            "image has no pixels ({}x{})",
            rgba.width(),
            rgba.height()
        )));
    }

    tracing::debug!(width = rgba.width(), height = rgba.height(), "decoded input");
    Ok(rgba)
}

/// Encode an image as JPEG at the given quality.
///
/// Alpha is dropped; the output is deterministic for identical input.
///
/// # Errors
///
/// Returns [`Error::Encode`] if the encoder fails.
pub fn encode(image: &RgbaImage, quality: u8) -> Result<EncodedArtifact> {
    let rgb: RgbImage = image.convert();

    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder.encode_image(&rgb).map_err(Error::Encode)?;
    }

    tracing::debug!(len = bytes.len(), quality, "encoded output");
    Ok(EncodedArtifact {
        bytes,
        content_type: CONTENT_TYPE,
    })
}
