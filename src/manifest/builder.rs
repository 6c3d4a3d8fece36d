use crate::core::cancel::CancelToken;
use crate::core::fs::list_files;
use crate::core::path::normalize_relative;
use crate::core::{InstallerError, InstallerResult};
use crate::hash::{self, DigestKind};
use crate::manifest::types::{Manifest, ManifestEntry};
use std::path::{Path, PathBuf};

/// Build the manifest of the files under `root`, using blob digests.
///
/// A missing `root` yields an empty manifest: nothing installed yet is a
/// valid state. Files are hashed in path order and `cancel` is checked
/// before each one; on cancellation the partial manifest is dropped.
pub fn build_local_manifest(root: &Path, cancel: &CancelToken) -> InstallerResult<Manifest> {
    build_local_manifest_with(root, DigestKind::Blob, cancel)
}

/// Same as [`build_local_manifest`] with an explicit digest kind.
pub fn build_local_manifest_with(
    root: &Path,
    kind: DigestKind,
    cancel: &CancelToken,
) -> InstallerResult<Manifest> {
    cancel.check()?;
    if !root.is_dir() {
        return Ok(Manifest::new());
    }

    let mut manifest = Manifest::new();
    for file in list_files(root)? {
        cancel.check()?;

        let relative = file
            .path()
            .strip_prefix(root)
            .map_err(|e| InstallerError::locked_with("Invalid path in local bundle", e))?;
        let size = file.metadata()?.len();
        let digest = hash::digest(file.path(), kind)?;

        let entry = ManifestEntry::new(normalize_relative(relative)).with_size(size);
        let entry = match kind {
            DigestKind::Blob => entry.with_blob_digest(digest),
            DigestKind::WholeFile => entry.with_file_digest(digest),
        };
        manifest.insert(entry);
    }

    Ok(manifest)
}

/// Async wrapper running the scan on the blocking pool.
pub async fn scan_local_bundle(root: PathBuf, cancel: CancelToken) -> InstallerResult<Manifest> {
    tokio::task::spawn_blocking(move || build_local_manifest(&root, &cancel))
        .await
        .map_err(|e| InstallerError::locked_with("Local scan task failed", e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let manifest =
            build_local_manifest(&temp.path().join("missing"), &CancelToken::new()).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_builds_relative_forward_slash_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("maps").join("north")).unwrap();
        fs::write(temp.path().join("readme.txt"), b"hello world\n").unwrap();
        fs::write(temp.path().join("maps").join("north").join("a.map"), b"abc").unwrap();

        let manifest = build_local_manifest(temp.path(), &CancelToken::new()).unwrap();
        assert_eq!(manifest.len(), 2);

        let readme = manifest.get("readme.txt").unwrap();
        assert_eq!(readme.size, Some(12));
        assert_eq!(
            readme.blob(),
            Some("3b18e512dba79e4c8300dd08aeb37f8e728b8dad")
        );
        assert_eq!(readme.file(), None);

        let map = manifest.get("maps/north/a.map").unwrap();
        assert_eq!(map.relative_path, "maps/north/a.map");
    }

    #[test]
    fn test_whole_file_kind() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("abc"), b"abc").unwrap();

        let manifest =
            build_local_manifest_with(temp.path(), DigestKind::WholeFile, &CancelToken::new())
                .unwrap();
        let entry = manifest.get("abc").unwrap();
        assert_eq!(entry.blob(), None);
        assert_eq!(
            entry.file(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_cancelled_scan_returns_cancelled() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f"), b"x").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = build_local_manifest(temp.path(), &cancel);
        assert!(matches!(result, Err(InstallerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_scan_local_bundle_async() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f"), b"x").unwrap();

        let manifest = scan_local_bundle(temp.path().to_path_buf(), CancelToken::new())
            .await
            .unwrap();
        assert_eq!(manifest.len(), 1);
    }
}
