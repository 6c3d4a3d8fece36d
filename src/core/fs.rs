//! Directory helpers used by the remote fetcher and the atomic installer.

use crate::core::cancel::CancelToken;
use crate::core::path::ensure_dir;
use crate::core::{InstallerError, InstallerResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Recursively copy `source` into `destination`, overwriting existing files.
///
/// Checks `cancel` between entries.
pub fn copy_dir_all(source: &Path, destination: &Path, cancel: &CancelToken) -> InstallerResult<()> {
    ensure_dir(destination)?;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        cancel.check()?;
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| InstallerError::locked_with("Invalid path while copying", e))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Run blocking filesystem work on the blocking pool.
pub async fn run_blocking<T, F>(task: F) -> InstallerResult<T>
where
    F: FnOnce() -> InstallerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| InstallerError::locked_with("Background file task failed", e))?
}

/// Every regular file under `root`, sorted by path.
pub fn list_files(root: &Path) -> InstallerResult<Vec<walkdir::DirEntry>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry);
        }
    }
    Ok(files)
}
