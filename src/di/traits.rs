//! Trait definitions for dependency injection

use crate::core::cancel::CancelToken;
use crate::core::InstallerResult;
use crate::events::{LogLine, Progress};
use crate::manifest::Manifest;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Receiver of the events a run emits
///
/// Replaces ambient subscriptions: the sink is handed to the updater when it
/// is built, so nothing can be emitted before a subscriber exists.
/// Implementations must be cheap and must not block.
pub trait EventSink: Send + Sync {
    /// A progress milestone (`0..=100`) with a short stage description
    fn progress(&self, progress: Progress);

    /// A formatted log line
    fn log(&self, line: &LogLine);
}

/// Remote side of an update: the manifest and the bundle itself
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Build the remote manifest from tree metadata, without downloading
    async fn fetch_remote_manifest(&self, cancel: &CancelToken) -> InstallerResult<Manifest>;

    /// Download and extract the bundle into `work_dir`, returning the
    /// directory holding the bundle files
    async fn fetch_and_extract_archive(
        &self,
        work_dir: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<PathBuf>;
}

/// Interactive folder picker supplied by a front end
///
/// Returns `None` when the user dismisses it.
#[async_trait]
pub trait ManualPicker: Send + Sync {
    async fn pick(&self) -> Option<PathBuf>;
}

/// Source of installation paths recorded by the OS (Windows registry)
pub trait RegistryProbe: Send + Sync {
    fn candidates(&self) -> Vec<PathBuf>;
}

/// Waits between retry attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Free space of the volume holding a path
pub trait DiskSpace: Send + Sync {
    fn available_space(&self, path: &Path) -> io::Result<u64>;
}

/// Filesystem moves performed by the atomic installer
pub trait FsOps: Send + Sync {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}
