//! Object metadata returned by storage backends.

use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Object metadata returned by listing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Key relative to the backend root
    pub path: PathBuf,
    /// Object size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }

    /// Whether the object's extension is `jpg`, ignoring case.
    pub fn is_jpeg(&self) -> bool {
        has_jpeg_extension(&self.path)
    }
}

/// Whether `path` carries a `.jpg` extension, ignoring case.
///
/// `.jpeg` deliberately does not count: the pipeline renames every JPEG it
/// produces to `.jpg`, so anything else has not been through it.
pub fn has_jpeg_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref().extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("jpg"))
}
