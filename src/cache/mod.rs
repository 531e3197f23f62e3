//! Disk memoization of derived statistics.
//!
//! Statistics computed from a key table are stored in the table's metadata
//! directory and reused while they are at least as new as the key table and
//! every declared dependent. Rebuilds run under an advisory lock on that
//! directory so cooperating processes never build the same artifact twice at
//! once, and a failed rebuild leaves no artifact behind.

pub mod artifact;
pub mod lock;

pub use artifact::{artifact_path, load_artifact, StatsArtifact};
pub use lock::DirectoryLock;

use crate::core::error::{ImputeError, Result};
use crate::core::types::Real;
use crate::dataset::TableView;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Outcome of a memoized build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    /// A fresh artifact was reused
    Cached,
    /// The artifact was (re)computed and written
    Rebuilt,
    /// The key table has nowhere to persist; computed in memory
    InMemory,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStatus::Cached => write!(f, "cached"),
            CacheStatus::Rebuilt => write!(f, "rebuilt"),
            CacheStatus::InMemory => write!(f, "in-memory"),
        }
    }
}

/// Whether the artifact at `path` exists and is not older than `key` and
/// every table in `dependents`. Tables without a modification signal are
/// ignored.
pub fn is_fresh(key: &dyn TableView, dependents: &[&dyn TableView], path: &Path) -> Result<bool> {
    let built = match std::fs::metadata(path) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let newer = |table: &dyn TableView| -> bool {
        table
            .modification_time()
            .map(|modified: SystemTime| modified > built)
            .unwrap_or(false)
    };
    Ok(!newer(key) && !dependents.iter().any(|table| newer(*table)))
}

/// Make sure the artifact at `artifact_path` is fresh, rebuilding it under
/// the key table's directory lock when it is not.
///
/// `rebuild` is called at most once. If it or the write fails, the stale or
/// partial artifact is removed before the lock is released and the error is
/// returned.
pub fn ensure_fresh<F>(
    key: &dyn TableView,
    artifact_path: &Path,
    dependents: &[&dyn TableView],
    rebuild: F,
) -> Result<CacheStatus>
where
    F: FnOnce() -> Result<StatsArtifact>,
{
    if is_fresh(key, dependents, artifact_path)? {
        log::debug!("Artifact {} is fresh", artifact_path.display());
        return Ok(CacheStatus::Cached);
    }

    let lock_dir = lock_dir_for(key, artifact_path)?;
    let _guard = DirectoryLock::acquire(&lock_dir)?;

    // Another process may have finished the build while we waited.
    if is_fresh(key, dependents, artifact_path)? {
        log::debug!(
            "Artifact {} was rebuilt by another process",
            artifact_path.display()
        );
        return Ok(CacheStatus::Cached);
    }

    log::info!("Rebuilding {}", artifact_path.display());
    let result = rebuild().and_then(|artifact| artifact.save(artifact_path));
    if let Err(e) = result {
        if artifact_path.exists() {
            if let Err(remove_err) = std::fs::remove_file(artifact_path) {
                log::warn!(
                    "Failed to remove stale artifact {}: {}",
                    artifact_path.display(),
                    remove_err
                );
            }
        }
        return Err(e);
    }
    Ok(CacheStatus::Rebuilt)
}

/// Compute a statistics block from `key`, reusing the artifact `stem` in its
/// metadata directory when fresh.
///
/// The block has `expected_rows` rows and one column per column of `key`; a
/// cached block is checked against the key table's column names.
pub fn memoize<F>(
    key: &dyn TableView,
    dependents: &[&dyn TableView],
    stem: &str,
    expected_rows: usize,
    compute: F,
) -> Result<(Array2<Real>, CacheStatus)>
where
    F: FnOnce() -> Result<Array2<Real>>,
{
    let names = key.column_names();
    let dir = match key.metadata_dir() {
        Some(dir) => dir,
        None => {
            log::debug!("No metadata directory for '{}', computing in memory", stem);
            return Ok((compute()?, CacheStatus::InMemory));
        }
    };

    let path = artifact_path(dir, stem);
    let status = ensure_fresh(key, &path, dependents, || {
        StatsArtifact::new(names.to_vec(), compute()?)
    })?;
    let artifact = load_artifact(&path, names, expected_rows)?;
    Ok((artifact.into_data(), status))
}

fn lock_dir_for(key: &dyn TableView, artifact_path: &Path) -> Result<PathBuf> {
    key.metadata_dir()
        .or_else(|| artifact_path.parent())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            ImputeError::config(format!(
                "no directory to lock for artifact {}",
                artifact_path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemoryTable;
    use ndarray::array;
    use std::cell::Cell;
    use std::time::Duration;
    use tempfile::TempDir;

    fn keyed(dir: &Path) -> MemoryTable {
        MemoryTable::from_array(array![[1.0, 2.0], [3.0, 4.0]])
            .with_metadata_dir(dir)
            .with_modification_time(SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_second_call_is_cached() {
        let dir = TempDir::new().unwrap();
        let table = keyed(dir.path());
        let builds = Cell::new(0);
        let compute = || -> Result<Array2<Real>> {
            builds.set(builds.get() + 1);
            Ok(array![[2.0, 3.0]])
        };

        let (first, status) = memoize(&table, &[], "sums", 1, compute).unwrap();
        assert_eq!(status, CacheStatus::Rebuilt);
        let (second, status) = memoize(&table, &[], "sums", 1, compute).unwrap();
        assert_eq!(status, CacheStatus::Cached);
        assert_eq!(builds.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_newer_dependent_forces_rebuild() {
        let dir = TempDir::new().unwrap();
        let table = keyed(dir.path());
        memoize(&table, &[], "sums", 1, || Ok(array![[0.0, 0.0]])).unwrap();

        let later = SystemTime::now() + Duration::from_secs(3600);
        let dependent = MemoryTable::from_array(array![[0.0]]).with_modification_time(later);
        let (_, status) = memoize(&table, &[&dependent], "sums", 1, || Ok(array![[1.0, 1.0]])).unwrap();
        assert_eq!(status, CacheStatus::Rebuilt);
    }

    #[test]
    fn test_failed_rebuild_leaves_no_artifact() {
        let dir = TempDir::new().unwrap();
        let path = artifact_path(dir.path(), "sums");
        std::fs::write(&path, b"stale").unwrap();
        let stale = keyed(dir.path()).with_modification_time(SystemTime::now() + Duration::from_secs(3600));

        let err = ensure_fresh(&stale, &path, &[], || Err(ImputeError::internal("boom"))).unwrap_err();
        assert_eq!(err.category(), "internal");
        assert!(!path.exists());
        // Lock was released
        assert!(DirectoryLock::try_acquire(dir.path()).unwrap().is_some());
    }

    #[test]
    fn test_without_metadata_dir_computes_in_memory() {
        let table = MemoryTable::from_array(array![[1.0]]);
        let (data, status) = memoize(&table, &[], "sums", 1, || Ok(array![[1.0]])).unwrap();
        assert_eq!(status, CacheStatus::InMemory);
        assert_eq!(data[[0, 0]], 1.0);
    }
}
