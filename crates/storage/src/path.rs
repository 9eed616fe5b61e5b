//! Object key validation.
//!
//! Keys arrive from outside the pipeline (URL-decoded catalog entries), so
//! every backend funnels them through [`validate`] before touching storage.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes an object key.
///
/// Keys are resolved component by component: empty segments and `.` are
/// dropped, `..` pops the previous segment and must never climb above the
/// store root. Null bytes are rejected outright.
///
/// # Returns
/// Returns the normalized key if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use photoferry_storage::validate_path;
/// // Valid keys
/// assert!(validate_path("trip/1.jpg").is_ok());
/// assert!(validate_path("trip/day-1/IMG_0001.HEIC").is_ok());
/// assert!(validate_path("trip/../other/1.jpg").is_ok()); // (never leaves the root)
/// // Invalid keys
/// assert!(validate_path("../secrets.json").is_err());
/// assert!(validate_path("trip/../../b").is_err());
/// assert!(validate_path("trip\0.jpg").is_err());
/// // Keys get resolved
/// assert_eq!(
///     validate_path("/trip//./day-1/1.jpg/").unwrap(),
///     Path::new("trip/day-1/1.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}
