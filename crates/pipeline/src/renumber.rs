use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use photoferry_storage::BackendHandle;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What [`renumber`] did to a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Renumbering {
    pub renamed: usize,
    pub unchanged: usize,
}

/// Rename the JPEGs directly inside `folder` to `1.jpg`, `2.jpg`, ... in
/// key order, keeping each file's extension text. An empty `folder` is the
/// store root.
///
/// Renaming is copy-then-delete. When a new name is still held by a file
/// that hasn't been renamed yet, every moved file goes through a temporary
/// `.renumber-N` name first so nothing is overwritten. On failure, staged
/// files are moved back where their original key is still free. Anything
/// left under a temporary name keeps its JPEG extension, so it stays listed
/// and counted and the next run folds it back into the sequence.
pub async fn renumber(backend: &BackendHandle, folder: &Path) -> Result<Renumbering> {
    let error = || ErrorKind::Renumber(folder.display().to_string());
    let prefix = (!folder.as_os_str().is_empty()).then_some(folder);
    let mut keys: Vec<PathBuf> = backend
        .list(prefix)
        .await
        .or_raise(error)?
        .into_iter()
        .filter(|info| info.is_jpeg() && info.path.parent() == Some(folder))
        .map(|info| info.path)
        .collect();
    keys.sort();
    let taken: HashSet<PathBuf> = keys.iter().cloned().collect();

    let mut summary = Renumbering::default();
    let mut moves = Vec::new();
    for (index, key) in keys.into_iter().enumerate() {
        let target = folder.join(format!("{}.{}", index + 1, extension(&key)));
        if target == key {
            summary.unchanged += 1;
        } else {
            moves.push((key, target));
        }
    }

    let sources: HashSet<&Path> = moves.iter().map(|(from, _)| from.as_path()).collect();
    if !moves.iter().any(|(_, to)| sources.contains(to.as_path())) {
        for (from, to) in &moves {
            rename(backend, from, to).await.or_raise(error)?;
            tracing::info!(from = %from.display(), to = %to.display(), "renamed");
            summary.renamed += 1;
        }
        return Ok(summary);
    }

    let mut counter = 0;
    let mut staged: Vec<Staged> = Vec::with_capacity(moves.len());
    for (from, to) in moves {
        let temporary = loop {
            let candidate = folder.join(format!(".renumber-{counter}.{}", extension(&from)));
            counter += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        let moved = rename(backend, &from, &temporary).await;
        if moved.is_err() {
            restore(backend, &staged, &HashSet::new()).await;
        }
        moved.or_raise(error)?;
        staged.push(Staged {
            original: from,
            temporary,
            target: to,
        });
    }

    for (index, entry) in staged.iter().enumerate() {
        let moved = rename(backend, &entry.temporary, &entry.target).await;
        if moved.is_err() {
            let occupied = staged[..index].iter().map(|done| done.target.as_path()).collect();
            restore(backend, &staged[index..], &occupied).await;
        }
        moved.or_raise(error)?;
        tracing::info!(from = %entry.original.display(), to = %entry.target.display(), "renamed");
        summary.renamed += 1;
    }
    Ok(summary)
}

/// A file parked under a temporary name on its way to `target`.
struct Staged {
    original: PathBuf,
    temporary: PathBuf,
    target: PathBuf,
}

/// Move staged files back to their original keys, skipping keys in `occupied`.
async fn restore(backend: &BackendHandle, staged: &[Staged], occupied: &HashSet<&Path>) {
    for entry in staged {
        let temporary = entry.temporary.display();
        if occupied.contains(entry.original.as_path()) {
            tracing::warn!(key = %temporary, "original key reused, leaving file under its temporary name");
            continue;
        }
        match rename(backend, &entry.temporary, &entry.original).await {
            Ok(()) => tracing::info!(from = %temporary, to = %entry.original.display(), "restored"),
            Err(err) => tracing::warn!(?err, key = %temporary, "could not restore, leaving file under its temporary name"),
        }
    }
}

fn extension(key: &Path) -> String {
    key.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default()
}

async fn rename(backend: &BackendHandle, from: &Path, to: &Path) -> photoferry_storage::error::Result<()> {
    backend.copy(from, to).await?;
    backend.delete(from).await
}
