//! refbatch-extract - Convert an image record archive into resized PNGs.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refbatch::source::cursor::{archive_records, normalize_records, CursorOptions};
use refbatch::{dump, Error, ResampleFilter};

/// Convert an image record archive into a directory of center-cropped PNGs.
#[derive(Parser, Debug)]
#[command(name = "refbatch-extract")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the image record archive (a tar of encoded images).
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Path to the output directory.
    #[arg(value_name = "OUT_DIR")]
    out_dir: PathBuf,

    /// New image size.
    #[arg(long, default_value = "256", value_name = "INT")]
    image_size: u32,

    /// Class name used as the filename prefix.
    #[arg(long, default_value = "bedroom", value_name = "NAME")]
    prefix: String,

    /// Maximum number of images to convert.
    #[arg(long, value_name = "INT")]
    max_images: Option<usize>,

    /// Skip the first N records; output numbering continues from there.
    #[arg(long, default_value = "0", value_name = "INT")]
    start_index: usize,

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
    if !args.archive.exists() {
        anyhow::bail!("Archive does not exist: {}", args.archive.display());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let file = fs::File::open(&args.archive)
        .with_context(|| format!("Failed to open {}", args.archive.display()))?;
    // Read-only mapping; the archive is not mutated while mapped.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map {}", args.archive.display()))?;

    let mut records = tar::Archive::new(Cursor::new(&map[..]));
    let blobs = archive_records(&mut records).context("Failed to read archive")?;
    let images = normalize_records(
        blobs,
        args.image_size,
        ResampleFilter::Box,
        CursorOptions {
            start_index: args.start_index,
            max_images: args.max_images,
        },
    );

    let report = dump::dump_images(&args.out_dir, images, &args.prefix, args.start_index)
        .context("Failed to write images")?;
    if report.written == 0 {
        return Err(Error::NoSourceData {
            path: args.archive.clone(),
        }
        .into());
    }

    println!(
        "Extracted {} images to {} ({} failed)",
        report.written,
        args.out_dir.display(),
        report.failed
    );

    Ok(())
}
