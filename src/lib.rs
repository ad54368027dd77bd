//! # refbatch
//!
//! Offline utilities for preparing image datasets used in generative-model
//! training and evaluation: extracting record archives into directories of
//! resized PNGs, packing directory trees into compressed reference
//! batches, and unpacking those batches back into individual images.
//!
//! A reference batch is a single `.npz` archive holding one `(N, S, S, 3)`
//! u8 array under the key `arr_0`, the format expected by image
//! distribution-similarity evaluation tooling.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use refbatch::source::tree::{load_directory, SelectOptions};
//! use refbatch::{archive, ReferenceBatch, ResampleFilter};
//!
//! # fn main() -> refbatch::Result<()> {
//! let loaded = load_directory(
//!     Path::new("artbench/impressionism"),
//!     256,
//!     ResampleFilter::Bicubic,
//!     &SelectOptions::default(),
//! )?;
//! let batch = ReferenceBatch::from_images(loaded.images)?;
//! archive::encode(&batch, "reference_impressionism.npz")?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod dump;
pub mod error;
pub mod normalize;
pub mod source;

pub use archive::ReferenceBatch;
pub use error::{Error, Result};
pub use normalize::{normalize, NormalizedImage, ResampleFilter};
