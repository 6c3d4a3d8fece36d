//! Crash-safe replacement of the installed bundle.
//!
//! The new bundle is copied next to the target, the target is renamed to a
//! backup, and the copy is renamed into place. A failed commit renames the
//! backup back, so the target is either the old tree or the new one.

pub mod swap;

pub use swap::{SwapState, SwapTransaction};

use crate::core::cancel::CancelToken;
use crate::core::path::ensure_dir;
use crate::core::{InstallerError, InstallerResult};
use crate::di::FsOps;
use crate::events::Reporter;
use chrono::{Duration, Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const BACKUP_RETENTION_DAYS: i64 = 7;
const LOCKED_MESSAGE: &str =
    "Atomic transaction failed. Make sure the game or launcher is closed (files may be locked).";

/// Plain `std::fs` renames.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl FsOps for StdFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

#[derive(Clone)]
pub struct AtomicInstaller {
    fs: Arc<dyn FsOps>,
    reporter: Reporter,
}

impl AtomicInstaller {
    pub fn new(reporter: Reporter) -> Self {
        Self::with_fs(Arc::new(StdFs), reporter)
    }

    pub fn with_fs(fs: Arc<dyn FsOps>, reporter: Reporter) -> Self {
        Self { fs, reporter }
    }

    /// Replace `target` with a copy of `staged`.
    ///
    /// With `dry_run` nothing is written; the paths that would be used are
    /// reported. Filesystem failures are permission/lock errors.
    pub fn apply_install(
        &self,
        staged: &Path,
        target: &Path,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> InstallerResult<()> {
        cancel.check()?;
        if dry_run {
            self.reporter.info(format!(
                "[dry-run] Would install {} into {}",
                staged.display(),
                target.display()
            ));
            return Ok(());
        }

        let parent = target.parent().ok_or_else(|| {
            InstallerError::locked(format!("Invalid install target: {}", target.display()))
        })?;
        ensure_dir(parent).map_err(as_locked)?;

        let stamp = Local::now().format(STAMP_FORMAT).to_string();
        let mut tx = SwapTransaction::new(self.fs.as_ref(), target, &stamp)?;
        let outcome = self.run_swap(&mut tx, staged, cancel);
        tx.clean_staging();
        outcome?;

        if let Some(name) = target.file_name() {
            collect_old_backups(parent, &name.to_string_lossy(), Local::now().naive_local());
        }
        Ok(())
    }

    fn run_swap(
        &self,
        tx: &mut SwapTransaction<'_>,
        staged: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<()> {
        self.reporter.info(format!(
            "Staging the new files in {}",
            tx.staging_path().display()
        ));
        tx.stage(staged, cancel).map_err(as_locked)?;

        // Last point where stopping leaves the target untouched
        cancel.check()?;
        tx.back_up().map_err(as_locked)?;

        if let Err(e) = tx.commit() {
            self.reporter
                .error(format!("Activating the new files failed: {}", e));
            match tx.roll_back() {
                Ok(()) => self.reporter.warn("The previous files were restored."),
                Err(restore) => self.reporter.error(format!(
                    "Restoring the previous files failed, a copy remains at {}: {}",
                    tx.backup_path().display(),
                    restore
                )),
            }
            return Err(InstallerError::locked_with(LOCKED_MESSAGE, e));
        }

        if let Err(e) = tx.discard_backup() {
            self.reporter.warn(format!(
                "Could not remove the backup {}: {}",
                tx.backup_path().display(),
                e
            ));
        }
        self.reporter.info("New files activated.");
        Ok(())
    }
}

/// Wrap raw filesystem failures in the lock error the caller can act on.
fn as_locked(error: InstallerError) -> InstallerError {
    match error {
        InstallerError::Io(e) => InstallerError::locked_with(LOCKED_MESSAGE, e),
        InstallerError::WalkDir(e) => InstallerError::locked_with(LOCKED_MESSAGE, e),
        other => other,
    }
}

/// Delete `<name>.backup.*` siblings older than the retention window.
///
/// The age comes from the stamp in the name, falling back to the directory's
/// modification time. Failures are ignored.
fn collect_old_backups(parent: &Path, name: &str, now: NaiveDateTime) {
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    let prefix = format!("{}.backup.", name).to_lowercase();
    let cutoff = now - Duration::days(BACKUP_RETENTION_DAYS);

    for entry in entries.filter_map(|e| e.ok()) {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.to_lowercase().starts_with(&prefix) {
            continue;
        }

        let stamp = file_name.get(prefix.len()..).unwrap_or_default();
        let created = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
            .ok()
            .or_else(|| modified_at(&entry));
        if created.is_some_and(|c| c < cutoff) {
            if let Err(e) = fs::remove_dir_all(entry.path()) {
                tracing::debug!("Could not remove old backup {}: {}", file_name, e);
            }
        }
    }
}

fn modified_at(entry: &fs::DirEntry) -> Option<NaiveDateTime> {
    let modified: SystemTime = entry.metadata().ok()?.modified().ok()?;
    Some(chrono::DateTime::<Local>::from(modified).naive_local())
}
