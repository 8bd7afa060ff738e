// src/main.rs
mod batch;
mod config;
mod extractors;
mod pdf;
mod schema;
mod storage;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::RunConfig;
use extractors::FieldExtractor;
use pdf::{LayoutSettings, LopdfReader};
use schema::FieldSchema;
use utils::AppError;

/// Pulls a fixed set of labelled fields out of every PDF in a directory
/// into one spreadsheet row per file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the input PDFs
    #[arg(short, long, default_value = config::DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Output spreadsheet (.xlsx or .csv)
    #[arg(short, long, default_value = config::DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// JSON file with extra aliases: {"field_name": ["alias", ...]}
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Debug mode - dump each PDF's reconstructed tables and lines
    #[arg(short, long)]
    debug: bool,

    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,

    /// Horizontal gap, in font sizes, that splits two table cells
    #[arg(long, default_value_t = 1.0)]
    cell_gap: f64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI arguments and set up logging (RUST_LOG wins over --verbose)
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting run with args: {:?}", args);

    if args.cell_gap.is_nan() || args.cell_gap <= 0.0 {
        return Err(AppError::Config(format!(
            "--cell-gap must be positive, got {}",
            args.cell_gap
        )));
    }

    // 2. Build the schema, with any extra aliases
    let mut schema = FieldSchema::standard();
    if let Some(path) = &args.aliases {
        let overrides = FieldSchema::load_alias_overrides(path)?;
        tracing::info!("Loaded alias overrides for {} fields from {}", overrides.len(), path.display());
        schema = schema.with_alias_overrides(&overrides)?;
    }

    // 3. Initialize the extractor
    let settings = LayoutSettings {
        cell_gap: args.cell_gap,
        ..LayoutSettings::default()
    };
    let extractor = FieldExtractor::new(schema, Box::new(LopdfReader::new(settings)))?;

    // 4. Process the directory
    let config = RunConfig::new(args.input_dir, args.output)
        .with_summary(args.summary)
        .with_debug(args.debug);
    let report = batch::run(&config, Arc::new(extractor)).await?;

    if report.failed_count() > 0 {
        tracing::warn!(
            "{} of {} files could not be read; their rows are blank",
            report.failed_count(),
            report.files.len()
        );
    }
    tracing::info!("Output written to {}", report.output_path.display());

    Ok(())
}
