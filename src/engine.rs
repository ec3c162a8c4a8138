//! The decode, upscale, watermark, encode pipeline.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::codec::{self, EncodedArtifact};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::resample::{self, DimensionLimits};
use crate::typeface::{self, Typeface};
use crate::watermark::{self, WatermarkPlacement};

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the input file.
    pub path: PathBuf,
    /// Where the output was written, if processing succeeded.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

/// A configured pipeline holding the resolved typeface.
///
/// Create once with [`Pipeline::new()`] and reuse for any number of images;
/// every call allocates its own buffers, so a shared `&Pipeline` is safe to
/// use from several threads.
pub struct Pipeline {
    config: PipelineConfig,
    face: Box<dyn Typeface>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("typeface", &self.face.name())
            .finish()
    }
}

impl Pipeline {
    /// Validate `config` and resolve its typeface.
    ///
    /// A missing or unreadable font file is not an error; the built-in
    /// bitmap font is used instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` fails validation.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let face = typeface::resolve(
            config.watermark.font_path.as_deref(),
            config.watermark.font_size,
        );
        Ok(Self { config, face })
    }

    /// Build a pipeline around an already-resolved typeface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` fails validation.
    pub fn with_typeface(config: PipelineConfig, face: Box<dyn Typeface>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, face })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the typeface in use.
    #[must_use]
    pub fn typeface_name(&self) -> &str {
        self.face.name()
    }

    fn limits(&self) -> DimensionLimits {
        DimensionLimits {
            max_dimension: self.config.max_dimension,
            max_pixels: self.config.max_pixels,
        }
    }

    /// Decode `input`, upscale it, stamp the watermark and encode the result.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`](crate::Error::Decode) if `input` is empty or not an image.
    /// - [`Error::InvalidDimensions`](crate::Error::InvalidDimensions) if the
    ///   upscaled image would exceed the configured ceiling.
    /// - [`Error::Encode`](crate::Error::Encode) if encoding fails.
    pub fn process(&self, input: &[u8]) -> Result<EncodedArtifact> {
        // Reject oversized inputs from the header, before any pixel is decoded.
        let (width, height) = codec::read_dimensions(input)?;
        resample::scaled_dimensions(width, height, self.config.scale_factor, self.limits())?;

        let image = codec::decode(input)?;
        let canvas = self.render(image)?;
        codec::encode(&canvas, self.config.quality)
    }

    /// Upscale an RGBA image and stamp the watermark, without any codec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`](crate::Error::InvalidDimensions)
    /// if the upscaled image would exceed the configured ceiling.
    pub fn render(&self, image: RgbaImage) -> Result<RgbaImage> {
        let mut canvas = resample::upscale(&image, self.config.scale_factor, self.limits())?;
        drop(image);

        self.apply_watermark(&mut canvas);
        Ok(canvas)
    }

    /// Stamp the watermark onto `canvas` in place.
    ///
    /// Returns `None` when the watermark text renders to nothing.
    pub fn apply_watermark(&self, canvas: &mut RgbaImage) -> Option<WatermarkPlacement> {
        watermark::apply(canvas, &self.config.watermark, self.face.as_ref())
    }

    /// Process a single image file: read, process, write.
    ///
    /// Returns a [`ProcessResult`] indicating success or failure.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path) -> ProcessResult {
        self.process_file_with(input, output, |bytes| Ok(bytes.to_vec()))
    }

    /// Like [`process_file`](Self::process_file), but `extract` first turns
    /// the raw file contents into image bytes (for example a base64 payload).
    #[must_use]
    pub fn process_file_with<F>(&self, input: &Path, output: &Path, extract: F) -> ProcessResult
    where
        F: Fn(&[u8]) -> Result<Vec<u8>>,
    {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            output: None,
            success: false,
            message: String::new(),
        };

        let raw = match std::fs::read(input) {
            Ok(raw) => raw,
            Err(e) => {
                result.message = format!("Failed to read: {e}");
                return result;
            }
        };

        let artifact = match extract(&raw).and_then(|bytes| self.process(&bytes)) {
            Ok(artifact) => artifact,
            Err(e) => {
                result.message = e.to_string();
                return result;
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match std::fs::write(output, artifact.bytes()) {
            Ok(()) => {
                result.success = true;
                result.output = Some(output.to_path_buf());
                result.message = format!(
                    "Watermarked ({} bytes, {})",
                    artifact.bytes().len(),
                    artifact.content_type()
                );
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Outputs keep the input file stem with the encoder's extension, or the
    /// full file name when several inputs share a stem (see [`output_names`]).
    /// Inputs whose output name would still collide are reported as failures
    /// rather than overwritten. Uses parallel iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    output: None,
                    success: false,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult {
                    path: output_dir.to_path_buf(),
                    output: None,
                    success: false,
                    message: format!("Failed to create output directory: {e}"),
                }];
            }
        }

        let jobs: Vec<(PathBuf, Option<PathBuf>)> = entries
            .iter()
            .cloned()
            .zip(
                output_names(&entries)
                    .into_iter()
                    .map(|name| name.map(|n| output_dir.join(n))),
            )
            .collect();

        let process_one = |(input, output): &(PathBuf, Option<PathBuf>)| match output {
            Some(output) => self.process_file(input, output),
            None => ProcessResult {
                path: input.clone(),
                output: None,
                success: false,
                message: "Output name clashes with another input; rename one of them".to_string(),
            },
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(process_one).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(process_one).collect()
        }
    }
}

/// Pick an output file name for each input of a batch.
///
/// Inputs keep their stem (`photo.png` -> `photo.jpg`) unless another input
/// shares it, in which case the whole file name is kept (`photo.png.jpg`).
/// Names that still clash after that are `None`. Comparison ignores case so
/// the outputs stay distinct on case-insensitive file systems.
fn output_names(inputs: &[PathBuf]) -> Vec<Option<String>> {
    let stem = |p: &PathBuf| p.file_stem().unwrap_or_default().to_string_lossy().to_string();
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for input in inputs {
        *stem_counts.entry(stem(input).to_lowercase()).or_default() += 1;
    }

    let names: Vec<String> = inputs
        .iter()
        .map(|input| {
            let stem = stem(input);
            let base = if stem_counts[&stem.to_lowercase()] > 1 {
                input.file_name().unwrap_or_default().to_string_lossy().to_string()
            } else {
                stem
            };
            format!("{base}.{}", codec::FILE_EXTENSION)
        })
        .collect();

    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for name in &names {
        *name_counts.entry(name.to_lowercase()).or_default() += 1;
    }

    names
        .into_iter()
        .map(|name| (name_counts[&name.to_lowercase()] == 1).then_some(name))
        .collect()
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif" | "tif" | "tiff"
        ),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.png"` becomes `"photo_watermarked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_watermarked.{}", codec::FILE_EXTENSION))
}
