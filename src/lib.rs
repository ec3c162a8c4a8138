//! Upscale images and stamp a gradient-filled text watermark.
//!
//! The pipeline decodes an input buffer, upscales it 2x with a Lanczos
//! filter, renders the watermark text into a coverage mask, pastes a
//! mirrored horizontal gradient through that mask in the bottom-right
//! corner (over an optional translucent plate), and encodes the result as
//! JPEG at quality 85. Every constant is configurable via [`PipelineConfig`].
//!
//! # Quick Start
//!
//! ```no_run
//! use glyphmark::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).expect("invalid config");
//! let input = std::fs::read("photo.png").unwrap();
//! let artifact = pipeline.process(&input).unwrap();
//! std::fs::write("photo.jpg", artifact.bytes()).unwrap();
//! ```
//!
//! # Fonts
//!
//! The watermark font is loaded from `watermark.font_path`. When the file is
//! missing or unreadable a built-in 8x8 bitmap font is used instead; this
//! never fails the pipeline.

#![deny(missing_docs)]

pub mod blending;
pub mod codec;
pub mod config;
mod engine;
pub mod error;
pub mod gradient;
pub mod resample;
pub mod transport;
pub mod typeface;
pub mod watermark;

pub use codec::EncodedArtifact;
pub use config::{Color, PipelineConfig, PlateConfig, WatermarkConfig};
pub use engine::{default_output_path, is_supported_image, Pipeline, ProcessResult};
pub use error::{Error, Result};
pub use watermark::WatermarkPlacement;
