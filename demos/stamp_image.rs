//! Watermark a single image.
//!
//! Usage:
//! ```sh
//! cargo run --example stamp_image -- input.png output.jpg
//! ```

use std::env;
use std::process;

use glyphmark::{Pipeline, PipelineConfig};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let pipeline = Pipeline::new(PipelineConfig::default()).expect("failed to initialize pipeline");
    let result = pipeline.process_file(input.as_ref(), output.as_ref());

    if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
