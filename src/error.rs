//! Error types for the glyphmark crate.

/// Errors that can occur while decoding, upscaling, watermarking or encoding an image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input buffer is empty or not a recognized, well-formed image.
    #[error("failed to decode input image: {0}")]
    Decode(String),

    /// The upscaled dimensions are zero or exceed the configured ceiling.
    #[error("invalid output dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested output width in pixels.
        width: u64,
        /// Requested output height in pixels.
        height: u64,
        /// Why the dimensions were rejected.
        reason: String,
    },

    /// Serializing the final image failed.
    #[error("failed to encode output image: {0}")]
    Encode(image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pipeline configuration is invalid or could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A transport payload lacks the field carrying the image.
    #[error("missing field: {0}")]
    MissingField(String),

    /// A transport payload carried malformed base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// A transport payload was not valid JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl Error {
    /// Short machine-readable name of the error category.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::InvalidDimensions { .. } => "invalid_dimensions",
            Self::Encode(_) => "encode",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::MissingField(_) | Self::InvalidBase64(_) | Self::InvalidJson(_) => "transport",
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
