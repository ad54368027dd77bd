//! Filesystem-tree adapter: recursive image discovery and batch loading.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::normalize::{normalize, NormalizedImage, ResampleFilter};

/// Extensions matched during discovery. Both cases are listed explicitly;
/// matching is case-sensitive.
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

/// Slicing applied to the sorted file list.
#[derive(Debug, Clone, Copy)]
pub struct SelectOptions {
    /// Keep only the held-out test split.
    pub use_test_set: bool,

    /// First index of the test split; everything before it is treated as
    /// the training split.
    pub test_start_idx: usize,

    /// Truncate the (possibly sliced) list to at most this many entries,
    /// from the front. `None` keeps everything.
    pub num_images: Option<usize>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            use_test_set: false,
            test_start_idx: 5000,
            num_images: None,
        }
    }
}

/// A loaded batch plus its failure count.
#[derive(Debug)]
pub struct LoadedBatch {
    /// Normalized images, in sorted-path order.
    pub images: Vec<NormalizedImage>,

    /// Files that failed to decode and were skipped.
    pub failed: usize,
}

/// Discover image files under `data_dir`, both directly and recursively.
///
/// A file reachable through several patterns is reported once: candidates
/// are deduplicated by canonical path. The result is sorted
/// lexicographically, so repeated runs over an unchanged tree are
/// identical.
///
/// # Errors
///
/// Returns `Pattern` if `data_dir` produces an unparsable glob pattern.
pub fn find_image_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut canonical = HashSet::new();
    let mut files = BTreeSet::new();

    for ext in IMAGE_EXTENSIONS {
        let direct = data_dir.join(format!("*.{ext}"));
        let recursive = data_dir.join(format!("**/*.{ext}"));
        for pattern in [direct, recursive] {
            for entry in glob::glob(&pattern.to_string_lossy())? {
                match entry {
                    Ok(path) => {
                        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
                        if canonical.insert(key) {
                            files.insert(path);
                        }
                    }
                    Err(err) => tracing::warn!("skipping unreadable path: {err}"),
                }
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Apply test-split slicing and truncation to a sorted file list.
///
/// # Errors
///
/// Returns `InsufficientData` if the test split starts past the end of the
/// list.
pub fn select_files(mut files: Vec<PathBuf>, opts: &SelectOptions) -> Result<Vec<PathBuf>> {
    if opts.use_test_set {
        if files.len() < opts.test_start_idx {
            return Err(Error::InsufficientData {
                available: files.len(),
                test_start_idx: opts.test_start_idx,
            });
        }
        files.drain(..opts.test_start_idx);
    }

    if let Some(limit) = opts.num_images {
        if files.len() < limit {
            tracing::warn!("only {} images available, {limit} requested", files.len());
        }
        files.truncate(limit);
    }

    Ok(files)
}

/// Load, decode, and normalize every file in the list.
///
/// Per-file failures are logged, counted, and skipped; they never abort
/// the run.
pub fn load_images(files: &[PathBuf], image_size: u32, filter: ResampleFilter) -> LoadedBatch {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Loading [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let mut images = Vec::with_capacity(files.len());
    let mut failed = 0;
    for path in files {
        match load_one(path, image_size, filter) {
            Ok(img) => images.push(img),
            Err(err) => {
                tracing::warn!("failed to load {}: {err}", path.display());
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    LoadedBatch { images, failed }
}

fn load_one(path: &Path, image_size: u32, filter: ResampleFilter) -> Result<NormalizedImage> {
    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    normalize(&img, image_size, filter)
}

/// Scan `data_dir` and build the selected, normalized batch.
///
/// # Errors
///
/// Returns `NoSourceData` if the directory has no image files or every
/// selected file fails to decode, and `InsufficientData` if the test split
/// starts past the end of the file list.
pub fn load_directory(
    data_dir: &Path,
    image_size: u32,
    filter: ResampleFilter,
    opts: &SelectOptions,
) -> Result<LoadedBatch> {
    let files = find_image_files(data_dir)?;
    if files.is_empty() {
        return Err(Error::NoSourceData {
            path: data_dir.to_path_buf(),
        });
    }
    tracing::info!("found {} images under {}", files.len(), data_dir.display());

    let files = select_files(files, opts)?;
    if opts.use_test_set {
        tracing::info!(
            "using test split from index {}: {} images",
            opts.test_start_idx,
            files.len()
        );
    }

    let batch = load_images(&files, image_size, filter);
    if batch.images.is_empty() {
        return Err(Error::NoSourceData {
            path: data_dir.to_path_buf(),
        });
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_image(path: &Path, value: u8) {
        image::RgbImage::from_pixel(20, 30, image::Rgb([value, value, value]))
            .save(path)
            .unwrap();
    }

    fn fake_paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{i:03}.png"))).collect()
    }

    #[test]
    fn test_discovery_is_sorted_and_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_image(&dir.path().join("b.png"), 1);
        write_image(&dir.path().join("a.jpg"), 2);
        write_image(&dir.path().join("sub/c.PNG"), 3);

        let files = find_image_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "sub/c.PNG"]);
    }

    #[test]
    fn test_discovery_reports_each_file_once() {
        // A file at the root matches both the direct and the recursive
        // pattern for its extension.
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("only.png"), 7);

        let files = find_image_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discovery_is_deterministic() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("deep")).unwrap();
        for (i, name) in ["z.png", "m.jpeg", "deep/a.png"].iter().enumerate() {
            write_image(&dir.path().join(name), i as u8);
        }

        assert_eq!(
            find_image_files(dir.path()).unwrap(),
            find_image_files(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_discovery_ignores_other_extensions() {
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("keep.png"), 1);
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(dir.path().join("image.bmp"), b"ignored").unwrap();

        let files = find_image_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_select_test_split_then_truncate() {
        let opts = SelectOptions {
            use_test_set: true,
            test_start_idx: 4,
            num_images: Some(3),
        };
        let selected = select_files(fake_paths(10), &opts).unwrap();
        assert_eq!(selected, fake_paths(10)[4..7].to_vec());
    }

    #[test]
    fn test_select_truncation_past_end_keeps_remainder() {
        let opts = SelectOptions {
            use_test_set: true,
            test_start_idx: 8,
            num_images: Some(5),
        };
        let selected = select_files(fake_paths(10), &opts).unwrap();
        assert_eq!(selected, fake_paths(10)[8..].to_vec());
    }

    #[test]
    fn test_select_insufficient_data() {
        let opts = SelectOptions {
            use_test_set: true,
            test_start_idx: 11,
            num_images: None,
        };
        let err = select_files(fake_paths(10), &opts).unwrap_err();
        match err {
            Error::InsufficientData {
                available,
                test_start_idx,
            } => {
                assert_eq!(available, 10);
                assert_eq!(test_start_idx, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_directory_skips_corrupt_files() {
        let dir = tempdir().unwrap();
        write_image(&dir.path().join("a.jpg"), 10);
        write_image(&dir.path().join("b.jpg"), 20);
        write_image(&dir.path().join("c.jpg"), 30);
        fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let batch = load_directory(
            dir.path(),
            8,
            ResampleFilter::Bicubic,
            &SelectOptions::default(),
        )
        .unwrap();

        assert_eq!(batch.images.len(), 3);
        assert_eq!(batch.failed, 1);
        for img in &batch.images {
            assert_eq!(img.shape(), &[8, 8, 3]);
        }
    }

    #[test]
    fn test_load_directory_empty_dir() {
        let dir = tempdir().unwrap();
        let err = load_directory(
            dir.path(),
            8,
            ResampleFilter::Bicubic,
            &SelectOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoSourceData { .. }));
    }

    #[test]
    fn test_load_directory_all_corrupt_escalates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.png"), b"garbage").unwrap();
        fs::write(dir.path().join("two.jpg"), b"more garbage").unwrap();

        let err = load_directory(
            dir.path(),
            8,
            ResampleFilter::Bicubic,
            &SelectOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoSourceData { .. }));
    }
}
