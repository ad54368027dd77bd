//! Custom error types for refbatch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the refbatch library.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable input items were found.
    #[error("no source images found under {path}")]
    NoSourceData { path: PathBuf },

    /// A batch was built from zero images.
    #[error("cannot build a reference batch from zero images")]
    EmptyBatch,

    /// A requested slice or offset exceeds the available item count.
    #[error(
        "not enough images for test split: found {available}, but the split starts at index {test_start_idx}"
    )]
    InsufficientData {
        available: usize,
        test_start_idx: usize,
    },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to decode an in-memory image record.
    #[error("failed to decode image record: {source}")]
    ImageDecode {
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Batch stacking received an image whose shape differs from the first.
    #[error("image {index} has shape {actual}, expected {expected}")]
    ShapeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// An archive is missing a required array.
    #[error("archive {path} has no {key:?} array")]
    MissingKey { key: &'static str, path: PathBuf },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive container error.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to read an array member from an archive.
    #[error("failed to read array: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// Failed to write an array member into an archive.
    #[error("failed to write array: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// A pixel buffer did not match its expected dimensions.
    #[error("pixel buffer shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A glob pattern failed to parse.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Result type alias for refbatch operations.
pub type Result<T> = std::result::Result<T, Error>;
