//! Writing normalized images back out as individual PNG files.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, RgbImage};
use ndarray::ArrayView3;

use crate::archive::ReferenceBatch;
use crate::error::{Error, Result};
use crate::normalize::NormalizedImage;

/// Outcome of a dump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpReport {
    /// Files written.
    pub written: usize,

    /// Records skipped because they failed to decode or convert.
    pub failed: usize,
}

/// Save one `(H, W, 3)` pixel array as a PNG file.
///
/// # Errors
///
/// Returns `ImageSave` if the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn save_image(pixels: ArrayView3<'_, u8>, path: &Path) -> Result<()> {
    let (height, width) = (pixels.shape()[0], pixels.shape()[1]);
    let buf: Vec<u8> = pixels.iter().copied().collect();
    let img: RgbImage = ImageBuffer::from_raw(width as u32, height as u32, buf).ok_or_else(|| {
        Error::Shape(ndarray::ShapeError::from_kind(
            ndarray::ErrorKind::IncompatibleShape,
        ))
    })?;
    img.save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a stream of normalized images as `{prefix}_{index:07}.png` files.
///
/// Indices continue the source's record numbering: the i-th item after the
/// cursor skip is named `start_index + i`. A failed record consumes its
/// index without producing a file, so surviving filenames always carry the
/// original dataset position.
///
/// # Errors
///
/// Returns an error if a file cannot be written. Decode failures are
/// counted in the report instead.
pub fn dump_images<I>(
    out_dir: &Path,
    images: I,
    prefix: &str,
    start_index: usize,
) -> Result<DumpReport>
where
    I: IntoIterator<Item = Result<NormalizedImage>>,
{
    let mut written = 0;
    let mut failed = 0;

    for (i, item) in images.into_iter().enumerate() {
        let index = start_index + i;
        match item {
            Ok(img) => {
                let path = out_dir.join(format!("{prefix}_{index:07}.png"));
                save_image(img.view(), &path)?;
                written += 1;
            }
            Err(err) => {
                tracing::warn!("skipping record {index}: {err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!("failed to convert {failed} records");
    }

    Ok(DumpReport { written, failed })
}

/// Write every image of a batch as `image_{index:04}.png` into `out_dir`.
///
/// Indices are archive positions, sequential from zero; they are not the
/// original dataset indices.
///
/// # Errors
///
/// Returns an error if any file cannot be written.
pub fn unpack_batch(batch: &ReferenceBatch, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(batch.len());
    for (i, img) in batch.images.outer_iter().enumerate() {
        let path = out_dir.join(format!("image_{i:04}.png"));
        save_image(img, &path)?;
        paths.push(path);
    }
    Ok(paths)
}
