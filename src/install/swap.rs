//! The rename-based swap of one directory, as an explicit state machine.
//!
//! ```text
//! Initial --stage--> Staged --back_up--> BackedUp --commit--> Committed
//!                                           |
//!                                           +--roll_back--> Initial
//! ```
//!
//! `commit` is the activation point. Everything before it is undone by
//! `roll_back`, which renames the backup onto the target again.

use crate::core::cancel::CancelToken;
use crate::core::fs::copy_dir_all;
use crate::core::path::remove_dir_if_exists;
use crate::core::{InstallerError, InstallerResult};
use crate::di::FsOps;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Initial,
    Staged,
    BackedUp,
    Committed,
}

pub struct SwapTransaction<'a> {
    fs: &'a dyn FsOps,
    target: PathBuf,
    staging: PathBuf,
    backup: PathBuf,
    backup_created: bool,
    state: SwapState,
}

impl<'a> SwapTransaction<'a> {
    /// Transaction for `target`, with `.new.<stamp>` and `.backup.<stamp>`
    /// siblings.
    pub fn new(fs: &'a dyn FsOps, target: &Path, stamp: &str) -> InstallerResult<Self> {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                InstallerError::locked(format!("Invalid install target: {}", target.display()))
            })?;
        let parent = target.parent().ok_or_else(|| {
            InstallerError::locked(format!("Invalid install target: {}", target.display()))
        })?;

        Ok(Self {
            fs,
            target: target.to_path_buf(),
            staging: parent.join(format!("{}.new.{}", name, stamp)),
            backup: parent.join(format!("{}.backup.{}", name, stamp)),
            backup_created: false,
            state: SwapState::Initial,
        })
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Copy `source` into the staging sibling, replacing a stale one.
    pub fn stage(&mut self, source: &Path, cancel: &CancelToken) -> InstallerResult<()> {
        self.require_state(SwapState::Initial)?;
        remove_dir_if_exists(&self.staging)?;
        copy_dir_all(source, &self.staging, cancel)?;
        self.state = SwapState::Staged;
        Ok(())
    }

    /// Move the live target aside, if there is one.
    pub fn back_up(&mut self) -> InstallerResult<()> {
        self.require_state(SwapState::Staged)?;
        if self.target.exists() {
            self.fs.rename(&self.target, &self.backup)?;
            self.backup_created = true;
        }
        self.state = SwapState::BackedUp;
        Ok(())
    }

    /// Move the staged copy into place.
    pub fn commit(&mut self) -> io::Result<()> {
        if self.state != SwapState::BackedUp {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("cannot commit from state {:?}", self.state),
            ));
        }
        self.fs.rename(&self.staging, &self.target)?;
        self.state = SwapState::Committed;
        Ok(())
    }

    /// Restore the backup after a failed commit.
    ///
    /// Only acts when the backup exists and the target does not, i.e. the
    /// backup rename ran and the commit rename did not.
    pub fn roll_back(&mut self) -> io::Result<()> {
        if self.state != SwapState::BackedUp {
            return Ok(());
        }
        if self.backup_created && self.backup.exists() && !self.target.exists() {
            self.fs.rename(&self.backup, &self.target)?;
            self.backup_created = false;
        }
        self.state = SwapState::Initial;
        Ok(())
    }

    /// Delete the backup of a committed swap.
    pub fn discard_backup(&mut self) -> InstallerResult<()> {
        if self.state == SwapState::Committed && self.backup_created {
            remove_dir_if_exists(&self.backup)?;
            self.backup_created = false;
        }
        Ok(())
    }

    /// Best-effort removal of the staging sibling.
    pub fn clean_staging(&self) {
        if let Err(e) = remove_dir_if_exists(&self.staging) {
            tracing::warn!("Could not remove {}: {}", self.staging.display(), e);
        }
    }

    fn require_state(&self, state: SwapState) -> InstallerResult<()> {
        if self.state != state {
            return Err(InstallerError::locked(format!(
                "Swap of {} is in state {:?}, expected {:?}",
                self.target.display(),
                self.state,
                state
            )));
        }
        Ok(())
    }
}
