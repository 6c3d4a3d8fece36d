//! Remote side of the update: the bundle published in the GitHub repository.
//!
//! The remote manifest is built from the git tree listing alone, so deciding
//! whether an update is needed never downloads the bundle. The archive is
//! fetched only when the manifests differ.

pub mod archive;
pub mod types;

use crate::core::cancel::CancelToken;
use crate::core::fs::{copy_dir_all, run_blocking};
use crate::core::path::{ensure_dir, remove_dir_if_exists, BUNDLE_DIR_NAME};
use crate::core::{InstallerError, InstallerResult};
use crate::di::{BundleSource, DiskSpace};
use crate::events::Reporter;
use crate::manifest::{Manifest, ManifestEntry};
use crate::transport::RetryingClient;
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use types::TreeResponse;

const TREE_API_URL: &str =
    "https://api.github.com/repos/ultimateasuna-lgtm/patches_archipel/git/trees/main?recursive=1";
const ARCHIVE_URL: &str =
    "https://github.com/ultimateasuna-lgtm/patches_archipel/archive/refs/heads/main.zip";
const REMOTE_PREFIX: &str = "Patches/Archipel/";

const ZIP_FILE_NAME: &str = "main.zip";
const EXTRACT_DIR_NAME: &str = "extracted";

/// Where the bundle is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoints {
    /// Recursive git tree listing of the published ref
    pub tree_url: String,
    /// Zip archive of the same ref
    pub archive_url: String,
    /// Repository path of the bundle root, with trailing `/`
    pub prefix: String,
}

impl Default for RemoteEndpoints {
    fn default() -> Self {
        Self {
            tree_url: TREE_API_URL.to_string(),
            archive_url: ARCHIVE_URL.to_string(),
            prefix: REMOTE_PREFIX.to_string(),
        }
    }
}

/// Free space probe backed by `fs2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fs2DiskSpace;

impl DiskSpace for Fs2DiskSpace {
    fn available_space(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}

/// Bundle source reading the GitHub tree API and archive endpoint.
pub struct GitHubBundleSource {
    client: RetryingClient,
    endpoints: RemoteEndpoints,
    disk: Arc<dyn DiskSpace>,
    reporter: Reporter,
}

impl GitHubBundleSource {
    /// Source for the fixed production endpoints.
    pub fn new(reporter: Reporter) -> InstallerResult<Self> {
        Ok(Self::with_parts(
            RetryingClient::new(reporter.clone())?,
            RemoteEndpoints::default(),
            Arc::new(Fs2DiskSpace),
            reporter,
        ))
    }

    pub fn with_parts(
        client: RetryingClient,
        endpoints: RemoteEndpoints,
        disk: Arc<dyn DiskSpace>,
        reporter: Reporter,
    ) -> Self {
        Self {
            client,
            endpoints,
            disk,
            reporter,
        }
    }

    pub fn endpoints(&self) -> &RemoteEndpoints {
        &self.endpoints
    }

    /// Build the remote manifest from the tree listing.
    ///
    /// Keeps files under the bundle prefix, keyed by their path relative to
    /// it. Entries without a path or outside the prefix are skipped. An empty
    /// result means the published bundle is broken and is an integrity error.
    pub async fn fetch_remote_manifest(&self, cancel: &CancelToken) -> InstallerResult<Manifest> {
        self.reporter
            .progress(10, "Scanning GitHub: fetching the remote tree...");
        self.reporter
            .info("Fetching the remote manifest from the GitHub tree API.");

        let body = self.client.get_string(&self.endpoints.tree_url, cancel).await?;
        let response: TreeResponse = serde_json::from_str(&body).map_err(|e| {
            InstallerError::network_with("Invalid GitHub response (missing tree).", e)
        })?;
        if response.truncated {
            self.reporter
                .warn("The GitHub tree listing is truncated; the remote manifest may be incomplete.");
        }

        let manifest = self.manifest_from_tree(response, cancel)?;
        if manifest.is_empty() {
            return Err(InstallerError::Integrity(format!(
                "No remote file found under {}.",
                self.endpoints.prefix.trim_end_matches('/')
            )));
        }

        self.reporter.progress(
            25,
            format!("GitHub scan done: {} remote files.", manifest.len()),
        );
        self.reporter
            .info(format!("Remote manifest loaded: {} files.", manifest.len()));
        Ok(manifest)
    }

    fn manifest_from_tree(
        &self,
        response: TreeResponse,
        cancel: &CancelToken,
    ) -> InstallerResult<Manifest> {
        let prefix = self.endpoints.prefix.as_str();
        let mut manifest = Manifest::new();

        for entry in response.tree {
            cancel.check()?;
            if !entry.is_file() {
                continue;
            }

            let Some(path) = entry.path.as_deref() else {
                continue;
            };
            if path.trim().is_empty() || !starts_with_ignore_case(path, prefix) {
                continue;
            }

            let relative = path[prefix.len()..].replace('\\', "/");
            if relative.trim().is_empty() {
                continue;
            }

            let mut item = ManifestEntry::new(relative);
            item.blob_digest = entry.sha.clone().filter(|s| !s.trim().is_empty());
            item.size = entry.size_bytes();
            manifest.insert(item);
        }

        Ok(manifest)
    }

    /// Download the archive into `work_dir`, extract it, and copy the bundle
    /// to `<work_dir>/Archipel`, which is returned.
    ///
    /// Stale state from an earlier attempt in the same `work_dir` is removed
    /// first. Extraction only starts once the volume has three times the
    /// archive size free.
    pub async fn fetch_and_extract_archive(
        &self,
        work_dir: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<PathBuf> {
        let work_dir = work_dir.to_path_buf();
        let zip_path = work_dir.join(ZIP_FILE_NAME);
        let extract_root = work_dir.join(EXTRACT_DIR_NAME);
        let output = work_dir.join(BUNDLE_DIR_NAME);

        let (dir, zip, extracted, bundle) = (
            work_dir.clone(),
            zip_path.clone(),
            extract_root.clone(),
            output.clone(),
        );
        run_blocking(move || {
            ensure_dir(&dir)?;
            remove_dir_if_exists(&extracted)?;
            remove_dir_if_exists(&bundle)?;
            if zip.exists() {
                fs::remove_file(&zip)?;
            }
            Ok(())
        })
        .await?;

        self.reporter.progress(45, "Downloading the GitHub archive...");
        self.reporter.info("Downloading the GitHub archive.");
        self.client
            .download_to_file(&self.endpoints.archive_url, &zip_path, cancel)
            .await?;

        let (disk, dir, zip) = (self.disk.clone(), work_dir.clone(), zip_path.clone());
        run_blocking(move || {
            let zip_size = fs::metadata(&zip)?.len();
            let available = disk.available_space(&dir)?;
            if let Err(e) = archive::ensure_free_space(&dir, zip_size, available) {
                let _ = fs::remove_file(&zip);
                return Err(e);
            }
            Ok(())
        })
        .await?;

        cancel.check()?;
        self.reporter.progress(55, "Extracting the archive...");
        self.reporter.info("Extracting the downloaded archive.");
        let (zip, root) = (zip_path.clone(), extract_root.clone());
        let bundle = run_blocking(move || {
            archive::extract_zip(&zip, &root)?;
            archive::locate_bundle(&root)
        })
        .await?;

        self.reporter.progress(65, "Preparing the remote files...");
        self.reporter
            .info("Copying the remote Archipel files to the local staging area.");
        let (source, destination, token) = (bundle, output.clone(), cancel.clone());
        run_blocking(move || copy_dir_all(&source, &destination, &token)).await?;

        Ok(output)
    }
}

#[async_trait]
impl BundleSource for GitHubBundleSource {
    async fn fetch_remote_manifest(&self, cancel: &CancelToken) -> InstallerResult<Manifest> {
        Self::fetch_remote_manifest(self, cancel).await
    }

    async fn fetch_and_extract_archive(
        &self,
        work_dir: &Path,
        cancel: &CancelToken,
    ) -> InstallerResult<PathBuf> {
        Self::fetch_and_extract_archive(self, work_dir, cancel).await
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}
