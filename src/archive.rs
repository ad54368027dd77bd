//! Reference-batch archive encode/decode.
//!
//! An archive is a numpy-compatible `.npz` file: a ZIP container of
//! DEFLATE-compressed `.npy` members. The image batch lives under the
//! fixed key `arr_0`; an optional `arr_1` member carries per-item labels
//! and round-trips untouched.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use ndarray::{stack, Array1, Array3, Array4, Axis};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::normalize::NormalizedImage;

/// Archive key of the stacked image batch. Downstream evaluation tooling
/// requires this exact name.
pub const IMAGES_KEY: &str = "arr_0";

/// Archive key of the optional per-item label array.
pub const LABELS_KEY: &str = "arr_1";

/// An ordered batch of normalized images, plus optional labels.
#[derive(Debug, Clone)]
pub struct ReferenceBatch {
    /// Stacked images, shape `(N, S, S, 3)`, values in `[0, 255]`.
    pub images: Array4<u8>,

    /// Optional per-item labels, shape `(N,)`.
    pub labels: Option<Array1<i64>>,
}

impl ReferenceBatch {
    /// Stack individual images into a batch.
    ///
    /// Order is preserved; it encodes dataset indexing.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBatch` for zero images and `ShapeMismatch` if any
    /// image's shape differs from the first.
    pub fn from_images(images: Vec<NormalizedImage>) -> Result<Self> {
        let expected = images.first().ok_or(Error::EmptyBatch)?.shape().to_vec();
        for (index, img) in images.iter().enumerate() {
            if img.shape() != expected.as_slice() {
                return Err(Error::ShapeMismatch {
                    index,
                    expected: format!("{expected:?}"),
                    actual: format!("{:?}", img.shape()),
                });
            }
        }

        let views: Vec<_> = images.iter().map(Array3::view).collect();
        let stacked = stack(Axis(0), &views)?;
        Ok(Self {
            images: stacked,
            labels: None,
        })
    }

    /// Number of images in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.shape()[0]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write a batch to a compressed archive at `path`.
///
/// The archive is staged in a temporary file next to the destination,
/// synced, and renamed into place, so a crash never leaves a truncated
/// archive behind. The staging file is removed on every error path.
///
/// # Errors
///
/// Returns an error if the staging file cannot be created, written, or
/// renamed into place.
pub fn encode<P: AsRef<Path>>(batch: &ReferenceBatch, path: P) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(staging);

    zip.start_file(format!("{IMAGES_KEY}.npy"), options)?;
    batch.images.write_npy(&mut zip)?;

    if let Some(labels) = &batch.labels {
        zip.start_file(format!("{LABELS_KEY}.npy"), options)?;
        labels.write_npy(&mut zip)?;
    }

    let staging = zip.finish()?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Read a batch back from an archive at `path`.
///
/// # Errors
///
/// Returns `MissingKey` if the archive has no `arr_0` member. A missing
/// `arr_1` is not an error.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<ReferenceBatch> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let images_member = member_name(&zip, IMAGES_KEY).ok_or_else(|| Error::MissingKey {
        key: IMAGES_KEY,
        path: path.to_path_buf(),
    })?;
    let images = Array4::<u8>::read_npy(zip.by_name(&images_member)?)?;

    let labels = match member_name(&zip, LABELS_KEY) {
        Some(member) => Some(Array1::<i64>::read_npy(zip.by_name(&member)?)?),
        None => None,
    };

    Ok(ReferenceBatch { images, labels })
}

/// numpy spells members as `name.npy`; accept the bare key too.
fn member_name<R: Read + Seek>(zip: &ZipArchive<R>, key: &str) -> Option<String> {
    let dotted = format!("{key}.npy");
    zip.file_names()
        .find(|name| *name == dotted || *name == key)
        .map(str::to_owned)
}
