//! Mock implementations of service traits for testing

use super::traits::{
    BundleSource, DiskSpace, EventSink, FsOps, ManualPicker, RegistryProbe, Sleeper,
};
use crate::core::cancel::CancelToken;
use crate::core::fs::copy_dir_all;
use crate::core::path::{ensure_dir, remove_dir_if_exists, BUNDLE_DIR_NAME};
use crate::core::{InstallerError, InstallerResult};
use crate::events::{LogLine, Progress};
use crate::manifest::{build_local_manifest, Manifest};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Sleeper that returns immediately and records what it was asked to wait
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// Disk space probe reporting a fixed number of free bytes
#[derive(Debug, Clone, Copy)]
pub struct FixedDiskSpace(pub u64);

impl DiskSpace for FixedDiskSpace {
    fn available_space(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0)
    }
}

/// Picker returning a preset answer
#[derive(Debug, Clone)]
pub struct MockPicker(pub Option<PathBuf>);

#[async_trait]
impl ManualPicker for MockPicker {
    async fn pick(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Registry probe returning a preset list
#[derive(Debug, Clone, Default)]
pub struct StaticRegistryProbe(pub Vec<PathBuf>);

impl RegistryProbe for StaticRegistryProbe {
    fn candidates(&self) -> Vec<PathBuf> {
        self.0.clone()
    }
}

/// Bundle source serving a local fixture folder
///
/// The remote manifest is the fixture's own manifest, so a target holding a
/// copy of the fixture is up to date.
pub struct MockBundleSource {
    fixture: PathBuf,
    fail_manifest: bool,
    manifest_fetches: AtomicUsize,
    archive_fetches: AtomicUsize,
}

impl MockBundleSource {
    pub fn new(fixture: impl Into<PathBuf>) -> Self {
        Self {
            fixture: fixture.into(),
            fail_manifest: false,
            manifest_fetches: AtomicUsize::new(0),
            archive_fetches: AtomicUsize::new(0),
        }
    }

    /// Source whose manifest fetch fails with a network error
    pub fn unreachable() -> Self {
        Self {
            fail_manifest: true,
            ..Self::new(PathBuf::new())
        }
    }

    pub fn manifest_fetches(&self) -> usize {
        self.manifest_fetches.load(Ordering::SeqCst)
    }

    pub fn archive_fetches(&self) -> usize {
        self.archive_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleSource for MockBundleSource {
    async fn fetch_remote_manifest(&self, cancel: &CancelToken) -> InstallerResult<Manifest> {
        self.manifest_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_manifest {
            return Err(InstallerError::network("Mock source is unreachable"));
        }
        build_local_manifest(&self.fixture, cancel)
    }

    async fn fetch_and_extract_archive(
        &self,
        work_dir: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<PathBuf> {
        self.archive_fetches.fetch_add(1, Ordering::SeqCst);
        ensure_dir(work_dir)?;
        let output = work_dir.join(BUNDLE_DIR_NAME);
        remove_dir_if_exists(&output)?;
        copy_dir_all(&self.fixture, &output, cancel)?;
        Ok(output)
    }
}

/// Filesystem that refuses to move a `.new.` staging copy onto `target`
///
/// Every other rename, including restoring a backup, goes through.
pub struct FailingCommitFs {
    pub target: PathBuf,
}

impl FsOps for FailingCommitFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_staging = from
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains(".new."));
        if to == self.target && from_staging {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file is locked by another process",
            ));
        }
        std::fs::rename(from, to)
    }
}

/// Sink recording every event
#[derive(Default)]
pub struct RecordingSink {
    progress: Mutex<Vec<Progress>>,
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn percents(&self) -> Vec<u8> {
        self.progress.lock().unwrap().iter().map(|p| p.percent).collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl EventSink for RecordingSink {
    fn progress(&self, progress: Progress) {
        self.progress.lock().unwrap().push(progress);
    }

    fn log(&self, line: &LogLine) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
