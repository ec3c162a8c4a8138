use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use glyphmark::{default_output_path, transport, Pipeline, PipelineConfig, ProcessResult};

#[derive(Parser)]
#[command(
    name = "glyphmark",
    about = "Upscale images 2x and stamp a gradient text watermark in the bottom-right corner",
    version,
    after_help = "Simple usage: glyphmark <image>  (writes <name>_watermarked.jpg next to it)\n\n\
                  Set RUST_LOG for finer-grained logging."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_watermarked.jpg)
    #[arg(short, long)]
    output: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watermark text (overrides the configuration)
    #[arg(long)]
    text: Option<String>,

    /// TrueType/OpenType font file (overrides the configuration)
    #[arg(long)]
    font: Option<PathBuf>,

    /// JPEG quality, 1-100 (overrides the configuration)
    #[arg(long)]
    quality: Option<u8>,

    /// Do not draw the translucent plate behind the text
    #[arg(long)]
    no_plate: bool,

    /// Treat input files as base64 text (plain or data URL)
    #[arg(long)]
    base64: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> glyphmark::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(text) = &cli.text {
        config.watermark.text.clone_from(text);
    }
    if let Some(font) = &cli.font {
        config.watermark.font_path = Some(font.clone());
    }
    if let Some(quality) = cli.quality {
        config.quality = quality;
    }
    if cli.no_plate {
        config.watermark.plate.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

fn extract_base64(raw: &[u8]) -> glyphmark::Result<Vec<u8>> {
    transport::from_base64(&String::from_utf8_lossy(raw))
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let pipeline = match Pipeline::new(config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Fatal: Failed to initialize pipeline: {e}");
            process::exit(1);
        }
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !cli.quiet {
        eprintln!(
            "Watermark {:?} using {} (x{}, quality {})",
            pipeline.config().watermark.text,
            pipeline.typeface_name(),
            pipeline.config().scale_factor,
            pipeline.config().quality,
        );
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: glyphmark <input_dir> -o <output_dir>");
            process::exit(1);
        };
        if cli.base64 {
            eprintln!("Error: --base64 is only supported for single files");
            process::exit(1);
        }
        pipeline.process_directory(input_path, &output_dir)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        if cli.base64 {
            vec![pipeline.process_file_with(input_path, &output_path, extract_base64)]
        } else {
            vec![pipeline.process_file(input_path, &output_path)]
        }
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, cli: &Cli) {
    if cli.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        match &result.output {
            Some(out) => eprintln!("[OK] {filename} -> {}", out.display()),
            None => eprintln!("[OK] {filename}"),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if cli.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
