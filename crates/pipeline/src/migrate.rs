use crate::ImageKey;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use photoferry_convert::{Conversion, Converter};
use photoferry_storage::BackendHandle;
use std::path::{Path, PathBuf};

/// Outcome of migrating a single key.
///
/// Only [`Migration::Converted`] counts towards a cycle's success total.
#[derive(Debug)]
pub enum Migration {
    /// Published under `key`; the source-named copy is gone if `key` differs.
    Converted { key: PathBuf },
    /// Video: copied and left as-is.
    Skipped,
    /// Copied, but the bytes couldn't be converted. The copy stays in the
    /// destination for inspection.
    Unconverted(Error),
    /// The copy or the replacement failed.
    Failed(Error),
}

impl Migration {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    /// Key the object was published under, when conversion succeeded.
    pub fn output_key(&self) -> Option<&Path> {
        match self {
            Self::Converted { key } => Some(key),
            _ => None,
        }
    }
}

/// Moves objects from the staging store to the destination store,
/// normalizing them on the way.
#[derive(Clone)]
pub struct Migrator {
    staging: BackendHandle,
    destination: BackendHandle,
    converter: Converter,
}

impl Migrator {
    pub fn new(staging: BackendHandle, destination: BackendHandle, converter: Converter) -> Self {
        Self {
            staging,
            destination,
            converter,
        }
    }

    /// Copy `key` to the destination, convert it, and replace the copy with
    /// the converted object.
    ///
    /// The converted object is written before the copy is deleted, so a
    /// failure in between leaves both rather than neither.
    pub async fn migrate(&self, key: &ImageKey) -> Migration {
        let data = match self.copy(key).await {
            Ok(data) => data,
            Err(err) => return Migration::Failed(err),
        };
        tracing::info!(%key, "copied");

        let (target, converted) = match self.convert(key, data).await {
            Ok(Conversion::Converted { key: target, data }) => (target, data),
            Ok(Conversion::Skipped) => return Migration::Skipped,
            Err(err) => return Migration::Unconverted(err),
        };
        if let Err(err) = self.replace(key.as_path(), &target, &converted).await {
            return Migration::Failed(err);
        }
        tracing::info!(%key, target = %target.display(), "converted");
        Migration::Converted { key: target }
    }

    async fn copy(&self, key: &ImageKey) -> Result<Vec<u8>> {
        let data = self.staging.read(key.as_path()).await.or_raise(|| ErrorKind::Migration)?;
        self.destination.write(key.as_path(), &data).await.or_raise(|| ErrorKind::Migration)?;
        Ok(data)
    }

    /// Decoding and encoding are CPU-bound, so they run on the blocking pool.
    async fn convert(&self, key: &ImageKey, data: Vec<u8>) -> Result<Conversion> {
        let converter = self.converter.clone();
        let path = key.as_path().to_path_buf();
        tokio::task::spawn_blocking(move || converter.convert(&path, &data))
            .await
            .or_raise(|| ErrorKind::Conversion)?
            .or_raise(|| ErrorKind::Conversion)
    }

    async fn replace(&self, source: &Path, target: &Path, data: &[u8]) -> Result<()> {
        self.destination.write(target, data).await.or_raise(|| ErrorKind::Migration)?;
        if target != source {
            self.destination.delete(source).await.or_raise(|| ErrorKind::Migration)?;
        }
        Ok(())
    }
}
