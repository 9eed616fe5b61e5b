use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use photoferry_storage::BackendHandle;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Keys containing this are never counted.
const THUMBNAIL_SEGMENT: &str = "Thumbnail/";
const NAME_FIELD: &str = "name";
const COUNT_FIELD: &str = "numImages";

/// What [`reconcile`] changed in the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Entries whose count was recomputed.
    pub updated: usize,
}

/// Recompute `numImages` for every index entry named in `folders`.
///
/// The index at `index_key` is a JSON array of objects. Entries not named in
/// `folders` are left alone, as is every field other than `numImages`. The
/// document is read once and written back once, pretty-printed.
pub async fn reconcile(backend: &BackendHandle, index_key: &Path, folders: &BTreeSet<String>) -> Result<Reconciliation> {
    let raw = backend.read(index_key).await.or_raise(|| ErrorKind::Reconcile)?;
    let mut index: Value = serde_json::from_slice(&raw).or_raise(|| ErrorKind::Reconcile)?;
    let entries = index.as_array_mut().ok_or_raise(|| ErrorKind::Reconcile)?;

    let mut summary = Reconciliation::default();
    for entry in entries.iter_mut() {
        let Some(name) = entry.get(NAME_FIELD).and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        if !folders.contains(&name) {
            continue;
        }
        let count = count_images(backend, &name).await?;
        if let Some(fields) = entry.as_object_mut() {
            fields.insert(COUNT_FIELD.to_string(), Value::from(count));
            tracing::info!(folder = %name, count, "updated image count");
            summary.updated += 1;
        }
    }

    let output = serde_json::to_vec_pretty(&index).or_raise(|| ErrorKind::Reconcile)?;
    backend.write(index_key, &output).await.or_raise(|| ErrorKind::Reconcile)?;
    Ok(summary)
}

/// JPEGs anywhere under `folder`, leaving out thumbnails.
async fn count_images(backend: &BackendHandle, folder: &str) -> Result<usize> {
    let files = backend.list(Some(Path::new(folder))).await.or_raise(|| ErrorKind::Reconcile)?;
    Ok(files
        .iter()
        .filter(|info| info.is_jpeg())
        .filter(|info| !info.path.to_string_lossy().contains(THUMBNAIL_SEGMENT))
        .count())
}
