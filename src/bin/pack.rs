//! refbatch-pack - Build a compressed reference batch from an image directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refbatch::source::tree::{load_directory, SelectOptions};
use refbatch::{archive, ReferenceBatch, ResampleFilter};

/// Create a reference batch archive from a directory of images.
#[derive(Parser, Debug)]
#[command(name = "refbatch-pack")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing images (searched recursively).
    #[arg(long, value_name = "DIR")]
    data_dir: PathBuf,

    /// Output archive path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Number of images to include.
    #[arg(long, default_value = "1000", value_name = "INT")]
    num_images: usize,

    /// Target image size.
    #[arg(long, default_value = "256", value_name = "INT")]
    image_size: u32,

    /// Only use held-out test split images.
    #[arg(long)]
    use_test_set: bool,

    /// First index of the test split; earlier files are the training split.
    #[arg(long, default_value = "5000", value_name = "INT")]
    test_start_idx: usize,

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
    if !args.data_dir.is_dir() {
        anyhow::bail!("Data directory does not exist: {}", args.data_dir.display());
    }

    let opts = SelectOptions {
        use_test_set: args.use_test_set,
        test_start_idx: args.test_start_idx,
        num_images: Some(args.num_images),
    };
    let loaded = load_directory(&args.data_dir, args.image_size, ResampleFilter::Bicubic, &opts)
        .context("Failed to load images")?;

    let batch = ReferenceBatch::from_images(loaded.images).context("Failed to stack images")?;
    tracing::info!("stacked batch shape: {:?}", batch.images.shape());

    archive::encode(&batch, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    // Re-open what was just written, as a verification pass.
    let verified = archive::decode(&args.output).context("Failed to verify archive")?;
    tracing::info!(
        "verified archive: {} images of shape {:?}",
        verified.len(),
        &verified.images.shape()[1..]
    );

    println!(
        "Created reference batch: {} ({} images, {} failed)",
        args.output.display(),
        verified.len(),
        loaded.failed
    );

    Ok(())
}
