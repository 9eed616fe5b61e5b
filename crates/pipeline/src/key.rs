use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use photoferry_convert::Format;
use photoferry_storage::validate_path;
use std::path::{Path, PathBuf};

/// Folder name excluded from renumbering, compared case-insensitively.
pub const THUMBNAIL_FOLDER: &str = "thumbnail";

/// A validated object key discovered for the current cycle.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{}", _0.display())]
pub struct ImageKey(PathBuf);

impl ImageKey {
    /// Validate `key`, which must already be in canonical form: relative,
    /// no empty, `.` or `..` segments and no trailing slash. Stores resolve
    /// keys segment by segment, so any other spelling would address a
    /// different object than the one registered.
    ///
    /// ```
    /// use photoferry_pipeline::ImageKey;
    ///
    /// let key = ImageKey::new("trip/day-1/IMG_0001.HEIC").unwrap();
    /// assert_eq!(key.top_level_folder(), Some("trip".to_string()));
    /// assert!(ImageKey::new("../etc/passwd").is_err());
    /// assert!(ImageKey::new("trip//IMG_0001.HEIC").is_err());
    /// assert!(ImageKey::new("").is_err());
    /// ```
    pub fn new(key: impl AsRef<Path>) -> Result<Self> {
        let raw = key.as_ref();
        let invalid = || ErrorKind::InvalidKey(raw.display().to_string());
        let path = validate_path(raw).or_raise(invalid)?;
        if path.as_os_str() != raw.as_os_str() {
            exn::bail!(invalid());
        }
        Ok(Self(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Every segment but the basename; empty for keys at the store root.
    pub fn parent_folder(&self) -> &Path {
        self.0.parent().unwrap_or(Path::new(""))
    }

    /// First segment of the parent folder, the unit the index counts by.
    /// `None` for keys at the store root.
    pub fn top_level_folder(&self) -> Option<String> {
        self.parent_folder().iter().next().map(|s| s.to_string_lossy().into_owned())
    }

    pub fn is_video(&self) -> bool {
        Format::from_path(&self.0).is_video()
    }
}

impl AsRef<Path> for ImageKey {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Whether the folder's last segment is `thumbnail`, ignoring case.
pub fn is_thumbnail_folder(folder: impl AsRef<Path>) -> bool {
    folder
        .as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(THUMBNAIL_FOLDER))
}
