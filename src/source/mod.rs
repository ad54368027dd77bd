//! Producers of raw images feeding the normalizer.

pub mod cursor;
pub mod tree;

pub use cursor::{archive_records, normalize_records, CursorOptions};
pub use tree::{find_image_files, load_directory, select_files, LoadedBatch, SelectOptions};
