//! Record-cursor adapter: a lazy, forward-only stream of encoded images.

use std::io::{self, Read};

use tar::Archive;

use crate::error::{Error, Result};
use crate::normalize::{normalize, NormalizedImage, ResampleFilter};

/// Cursor window over a record sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorOptions {
    /// Skip this many leading records before yielding any.
    pub start_index: usize,

    /// Stop after this many records past the skip; `None` consumes the
    /// whole cursor. Records that fail to decode count toward the cap.
    pub max_images: Option<usize>,
}

/// Decode and normalize a stream of raw image records.
///
/// Records are consumed one at a time; the source is never materialized,
/// so it may be far larger than memory. The skip applies to raw records,
/// before any decode work. Decode failures surface as `Err` items and
/// leave the stream running.
pub fn normalize_records<I>(
    records: I,
    image_size: u32,
    filter: ResampleFilter,
    opts: CursorOptions,
) -> impl Iterator<Item = Result<NormalizedImage>>
where
    I: IntoIterator<Item = io::Result<Vec<u8>>>,
{
    records
        .into_iter()
        .skip(opts.start_index)
        .take(opts.max_images.unwrap_or(usize::MAX))
        .map(move |record| {
            let blob = record?;
            let img =
                image::load_from_memory(&blob).map_err(|source| Error::ImageDecode { source })?;
            normalize(&img, image_size, filter)
        })
}

/// Iterate a tar archive's file entries, in entry order, as raw records.
///
/// Non-file entries (directories, link headers) are skipped; they are not
/// records and consume no cursor position.
///
/// # Errors
///
/// Returns an error if the archive header cannot be read. Per-entry read
/// errors surface as `Err` items of the iterator.
pub fn archive_records<R: Read>(
    archive: &mut Archive<R>,
) -> Result<impl Iterator<Item = io::Result<Vec<u8>>> + '_> {
    let entries = archive.entries()?;
    Ok(entries.filter_map(|entry| match entry {
        Ok(entry) if !entry.header().entry_type().is_file() => None,
        Ok(mut entry) => {
            let mut blob = Vec::new();
            Some(entry.read_to_end(&mut blob).map(|_| blob))
        }
        Err(err) => Some(Err(err)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_blob(value: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(9, 9, image::Rgb([value, value, value]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn tar_of(blobs: &[Vec<u8>]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (i, blob) in blobs.iter().enumerate() {
            let mut header = tar::Header::new_gnu();
            header.set_size(blob.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{i:03}.png"), blob.as_slice())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn blobs_ok(blobs: Vec<Vec<u8>>) -> impl Iterator<Item = io::Result<Vec<u8>>> {
        blobs.into_iter().map(Ok)
    }

    #[test]
    fn test_skip_and_limit_window() {
        let blobs: Vec<_> = (0..5u8).map(|i| png_blob(i * 40)).collect();
        let opts = CursorOptions {
            start_index: 2,
            max_images: Some(2),
        };

        let images: Vec<_> = normalize_records(blobs_ok(blobs), 4, ResampleFilter::Box, opts)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(images.len(), 2);
        // The first yielded image is record 2 of the cursor.
        assert!(images[0][[0, 0, 0]].abs_diff(80) <= 1);
        assert!(images[1][[0, 0, 0]].abs_diff(120) <= 1);
    }

    #[test]
    fn test_unbounded_consumes_whole_cursor() {
        let blobs: Vec<_> = (0..4u8).map(png_blob).collect();
        let opts = CursorOptions::default();

        let count = normalize_records(blobs_ok(blobs), 4, ResampleFilter::Box, opts)
            .filter(Result::is_ok)
            .count();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_corrupt_record_yields_error_and_stream_continues() {
        let blobs = vec![png_blob(10), b"not an image".to_vec(), png_blob(30)];
        let opts = CursorOptions::default();

        let items: Vec<_> =
            normalize_records(blobs_ok(blobs), 4, ResampleFilter::Box, opts).collect();

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(Error::ImageDecode { .. })));
        assert!(items[2].is_ok());
    }

    #[test]
    fn test_archive_records_preserves_entry_order() {
        let blobs: Vec<_> = (0..3u8).map(|i| png_blob(i * 100)).collect();
        let data = tar_of(&blobs);

        let mut archive = Archive::new(Cursor::new(&data[..]));
        let records: Vec<_> = archive_records(&mut archive)
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(records, blobs);
    }

    #[test]
    fn test_archive_records_empty_archive() {
        let data = tar_of(&[]);
        let mut archive = Archive::new(Cursor::new(&data[..]));
        assert_eq!(archive_records(&mut archive).unwrap().count(), 0);
    }
}
