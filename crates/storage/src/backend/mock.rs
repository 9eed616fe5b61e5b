//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::StorageBackend;

/// Backend operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    Write,
    Copy,
    Delete,
}

/// In-memory storage backend for testing.
///
/// Objects are stored in a sorted map behind a [`RwLock`], so all trait
/// methods operate on `&self`. Failures can be injected per operation and
/// key with [`fail_on`](Self::fail_on) to exercise partial-failure paths.
///
/// # Examples
///
/// ```
/// use photoferry_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("trip/a.jpg", b"jpeg"),
/// ]);
/// backend.copy(Path::new("trip/a.jpg"), Path::new("trip/1.jpg")).await?;
/// assert!(backend.contains("trip/1.jpg").await);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
    failures: Mutex<HashSet<(Operation, PathBuf)>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with objects.
    ///
    /// Panics if any key fails validation: if test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// Make every `operation` touching `path` fail with a backend error.
    ///
    /// For [`Operation::List`] the path is the listing prefix, for
    /// [`Operation::Copy`] it is the source key.
    pub fn fail_on(self, operation: Operation, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let Ok(validated) = validate_path(&path) else {
            panic!("MockBackend::fail_on: invalid path {}", path.display());
        };
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).insert((operation, validated));
        self
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<PathBuf> {
        self.storage.read().await.keys().cloned().collect()
    }

    /// Whether an object is stored under `path`.
    pub async fn contains(&self, path: impl AsRef<Path>) -> bool {
        match validate_path(path) {
            Ok(path) => self.storage.read().await.contains_key(&path),
            Err(_) => false,
        }
    }

    fn check(&self, operation: Operation, path: &Path) -> Result<()> {
        let failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if failures.contains(&(operation, path.to_path_buf())) {
            exn::bail!(ErrorKind::BackendError(format!("injected {operation:?} failure: {}", path.display())));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        if let Some(pfx) = &validated_prefix
            && let Err(e) = self.check(Operation::List, pfx)
        {
            return Box::pin(futures::stream::once(async { Err(e) }));
        }

        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding.
            let entries: Vec<(PathBuf, OffsetDateTime, u64)> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| match &validated_prefix {
                        Some(pfx) => path.starts_with(pfx),
                        None => true,
                    })
                    .map(|(path, (inserted, data))| (path.clone(), *inserted, data.len() as u64))
                    .collect()
            };
            for (path, inserted, size) in entries {
                yield Ok(FileInfo::new(path, size, inserted));
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.check(Operation::Read, &path)?;
        let (_inserted, data) =
            self.storage.read().await.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(data)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.check(Operation::Write, &path)?;
        self.storage.write().await.insert(path, (OffsetDateTime::now_utc(), data.to_vec()));
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let from = validate_path(from)?;
        let to = validate_path(to)?;
        self.check(Operation::Copy, &from)?;
        let mut guard = self.storage.write().await;
        let (_inserted, data) = guard.get(&from).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(from)))?;
        guard.insert(to, (OffsetDateTime::now_utc(), data));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.check(Operation::Delete, &path)?;
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let backend = MockBackend::default();
        backend.write(Path::new("trip/1.jpg"), b"hello").await.unwrap();
        assert_eq!(backend.read(Path::new("trip/1.jpg")).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let backend = MockBackend::default();
        let err = backend.read(Path::new("missing.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_copy_and_delete() {
        let backend = MockBackend::with_files([("trip/b.jpg", b"b")]);
        backend.copy(Path::new("trip/b.jpg"), Path::new("trip/1.jpg")).await.unwrap();
        backend.delete(Path::new("trip/b.jpg")).await.unwrap();
        assert_eq!(backend.keys().await, vec![PathBuf::from("trip/1.jpg")]);
        let err = backend.delete(Path::new("trip/b.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let backend = MockBackend::with_files([
            ("trip/1.jpg", b"a"),
            ("trip/Thumbnail/1.jpg", b"b"),
            ("trip2/1.jpg", b"c"),
        ]);
        let files = backend.list(Some(Path::new("trip"))).await.unwrap();
        let paths: Vec<_> = files.into_iter().map(|f| f.path).collect();
        assert_eq!(paths, vec![PathBuf::from("trip/1.jpg"), PathBuf::from("trip/Thumbnail/1.jpg")]);
        assert_eq!(backend.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let backend = MockBackend::with_files([("trip/a.jpg", b"a")])
            .fail_on(Operation::Copy, "trip/a.jpg")
            .fail_on(Operation::List, "trip");
        let err = backend.copy(Path::new("trip/a.jpg"), Path::new("trip/1.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
        assert!(backend.list(Some(Path::new("trip"))).await.is_err());
        // Other operations on the same key are unaffected
        assert_eq!(backend.read(Path::new("trip/a.jpg")).await.unwrap(), b"a");
        assert!(backend.list(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let backend = MockBackend::default();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../escape"), b"bad").await.is_err());
        assert!(!backend.contains("../escape").await);
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockBackend::with_files([("../escape", Vec::from(*b"bad"))]);
    }
}
