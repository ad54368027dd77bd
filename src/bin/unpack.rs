//! refbatch-unpack - Explode a batch archive into individual PNG files.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refbatch::{archive, dump};

/// Write every image of a batch archive as an individual PNG file.
#[derive(Parser, Debug)]
#[command(name = "refbatch-unpack")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input archive path.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Output directory for PNG files.
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("refbatch={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let batch = archive::decode(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let shape = batch.images.shape();
    tracing::info!("number of images: {}", shape[0]);
    tracing::info!("image size: {}x{}", shape[1], shape[2]);
    tracing::info!("number of channels: {}", shape[3]);
    if let Some(labels) = &batch.labels {
        tracing::info!("labels present: {}", labels.len());
    }
    if let (Some(min), Some(max)) = (batch.images.iter().min(), batch.images.iter().max()) {
        tracing::info!("value range: {min} - {max}");
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let paths = dump::unpack_batch(&batch, &args.output_dir).context("Failed to write images")?;

    println!(
        "Wrote {} images to {}",
        paths.len(),
        args.output_dir.display()
    );

    Ok(())
}
