//! One end-to-end update.
//!
//! ```text
//! ResolvePath -> FetchRemoteManifest -> BuildLocalManifest -> Compare
//!   -> UpToDate
//!    | DryRunReport
//!    | Download -> ValidateIntegrity -> AtomicSwap
//!   -> Done
//! ```
//!
//! Every step returns `InstallerResult`; [`Updater::run`] is the only place
//! that turns errors into an [`InstallResult`].

pub mod types;

pub use types::{Cancelled, InstallResult, InstallerOptions};

use crate::core::cancel::CancelToken;
use crate::core::fs::run_blocking;
use crate::core::path::{bundle_dir, ensure_dir, remove_dir_if_exists, scratch_root, ROOT_DIR_NAME};
use crate::core::{InstallerError, InstallerResult};
use crate::di::{BundleSource, ManualPicker};
use crate::events::Reporter;
use crate::install::AtomicInstaller;
use crate::manifest::{compare, scan_local_bundle, validate_extracted_bundle};
use crate::resolver::PathResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Updater {
    source: Arc<dyn BundleSource>,
    resolver: PathResolver,
    installer: AtomicInstaller,
    reporter: Reporter,
    scratch_root: PathBuf,
}

impl Updater {
    pub fn new(
        source: Arc<dyn BundleSource>,
        resolver: PathResolver,
        installer: AtomicInstaller,
        reporter: Reporter,
    ) -> Self {
        Self {
            source,
            resolver,
            installer,
            reporter,
            scratch_root: scratch_root(),
        }
    }

    /// Use `dir` instead of the system temp folder for scratch directories.
    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = dir.into();
        self
    }

    /// Run one update.
    ///
    /// The picker is offered only when `allow_manual` is set and the run is
    /// not silent. Failures come back as an `InstallResult`; only
    /// cancellation is an `Err`.
    pub async fn run(
        &self,
        options: &InstallerOptions,
        allow_manual: bool,
        picker: Option<&dyn ManualPicker>,
        cancel: &CancelToken,
    ) -> Result<InstallResult, Cancelled> {
        self.reporter.reset();
        match self.execute(options, allow_manual, picker, cancel).await {
            Ok(result) => {
                self.reporter.info(&result.message);
                Ok(result)
            }
            Err(InstallerError::Cancelled) => {
                self.reporter.warn("Operation cancelled.");
                Err(Cancelled)
            }
            Err(e) => {
                self.reporter.error(e.detailed());
                Ok(InstallResult::failure(&e))
            }
        }
    }

    async fn execute(
        &self,
        options: &InstallerOptions,
        allow_manual: bool,
        picker: Option<&dyn ManualPicker>,
        cancel: &CancelToken,
    ) -> InstallerResult<InstallResult> {
        self.reporter
            .progress(0, format!("Detecting the {} folder...", ROOT_DIR_NAME));
        let root = self
            .resolver
            .resolve(
                options.forced_path.as_deref(),
                allow_manual && !options.silent,
                picker,
                cancel,
            )
            .await?;
        let target = bundle_dir(&root);
        self.reporter
            .info(format!("Install target: {}", target.display()));

        self.reporter.progress(8, "Scanning GitHub...");
        let remote = self.source.fetch_remote_manifest(cancel).await?;

        self.reporter.progress(35, "Scanning the local files...");
        let local = scan_local_bundle(target.clone(), cancel.clone()).await?;
        self.reporter
            .info(format!("Local manifest: {} files.", local.len()));

        let comparison = compare(&local, &remote);
        for path in &comparison.unverifiable {
            self.reporter.warn(format!(
                "Remote entry {} has neither a digest nor a size; it matches any local file.",
                path
            ));
        }

        if !local.is_empty() && comparison.equivalent {
            self.reporter.progress(100, "Already up to date.");
            return Ok(InstallResult::up_to_date(
                "Archipel is already up to date. Nothing to do.",
            ));
        }

        if options.dry_run {
            self.reporter.info(format!(
                "[dry-run] {} local files differ from {} remote files; {} would be updated.",
                local.len(),
                remote.len(),
                target.display()
            ));
            self.reporter.progress(100, "Dry run complete.");
            return Ok(InstallResult::updated(
                "Dry run: an update is available and would be applied.",
            ));
        }

        let scratch = self
            .scratch_root
            .join(format!("{:032x}", rand::random::<u128>()));
        let dir = scratch.clone();
        run_blocking(move || ensure_dir(&dir)).await?;
        let outcome = self.download_and_install(&scratch, &target, cancel).await;
        let dir = scratch.clone();
        if let Err(e) = run_blocking(move || remove_dir_if_exists(&dir)).await {
            self.reporter.warn(format!(
                "Could not remove the scratch directory {}: {}",
                scratch.display(),
                e
            ));
        }
        outcome?;

        self.reporter.progress(100, "Update complete.");
        Ok(InstallResult::updated("Archipel was updated successfully."))
    }

    async fn download_and_install(
        &self,
        scratch: &Path,
        target: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<()> {
        let staged = self.source.fetch_and_extract_archive(scratch, cancel).await?;
        let dir = staged.clone();
        run_blocking(move || validate_extracted_bundle(&dir)).await?;
        cancel.check()?;

        self.reporter.progress(80, "Applying the update...");
        let installer = self.installer.clone();
        let (target, token) = (target.to_path_buf(), cancel.clone());
        run_blocking(move || installer.apply_install(&staged, &target, false, &token)).await
    }
}
