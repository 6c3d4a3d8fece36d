//! Zip extraction and bundle lookup inside the extracted tree.

use crate::core::path::{bundle_dir, ensure_dir, has_bundle_layout};
use crate::core::{InstallerError, InstallerResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Multiple of the archive size that must be free before extracting:
/// the zip, the extracted tree and the staged copy coexist on disk.
pub const FREE_SPACE_FACTOR: u64 = 3;

/// Fail unless `available` covers `FREE_SPACE_FACTOR` times `archive_size`.
pub fn ensure_free_space(dir: &Path, archive_size: u64, available: u64) -> InstallerResult<()> {
    let required = archive_size.saturating_mul(FREE_SPACE_FACTOR);
    if available < required {
        return Err(InstallerError::locked(format!(
            "Not enough disk space on the volume holding {}: {} bytes required, {} available.",
            dir.display(),
            required,
            available
        )));
    }
    Ok(())
}

/// Extract `archive` into `destination`.
pub fn extract_zip(archive: &Path, destination: &Path) -> InstallerResult<()> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| InstallerError::Integrity(format!("Invalid zip archive: {}", e)))?;

    ensure_dir(destination)?;
    zip.extract(destination)
        .map_err(|e| InstallerError::Integrity(format!("Zip extraction failed: {}", e)))?;
    Ok(())
}

/// Find `<top>/Patches/Archipel` under the first top-level folder of the
/// extracted archive that has it.
pub fn locate_bundle(extract_root: &Path) -> InstallerResult<PathBuf> {
    let mut tops: Vec<PathBuf> = fs::read_dir(extract_root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    tops.sort();

    tops.into_iter()
        .find(|top| has_bundle_layout(top))
        .map(|top| bundle_dir(&top))
        .ok_or_else(|| {
            InstallerError::Integrity(
                "The Patches/Archipel folder is missing from the downloaded archive.".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, content) in files {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_free_space_rule() {
        let dir = Path::new("work");
        assert!(ensure_free_space(dir, 100, 300).is_ok());

        let err = ensure_free_space(dir, 100, 299).unwrap_err();
        assert_eq!(
            err.exit_code(),
            archipel_core::InstallerExitCode::PermissionOrLockedError
        );
    }

    #[test]
    fn test_extract_and_locate() {
        let temp = TempDir::new().unwrap();
        let zip_path = temp.path().join("main.zip");
        write_zip(
            &zip_path,
            &[
                ("patches_archipel-main/README.md", b"readme"),
                ("patches_archipel-main/Patches/Archipel/a.txt", b"hello"),
                ("patches_archipel-main/Patches/Archipel/sub/b.bin", b"bin"),
            ],
        );

        let extract_root = temp.path().join("extracted");
        extract_zip(&zip_path, &extract_root).unwrap();

        let bundle = locate_bundle(&extract_root).unwrap();
        assert!(bundle.ends_with(Path::new("Patches").join("Archipel")));
        assert_eq!(fs::read(bundle.join("sub").join("b.bin")).unwrap(), b"bin");
    }

    #[test]
    fn test_locate_missing_bundle() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("repo-main").join("Other")).unwrap();
        let result = locate_bundle(temp.path());
        assert!(matches!(result, Err(InstallerError::Integrity(_))));
    }

    #[test]
    fn test_corrupt_zip_is_integrity_error() {
        let temp = TempDir::new().unwrap();
        let zip_path = temp.path().join("main.zip");
        fs::write(&zip_path, b"definitely not a zip").unwrap();

        let result = extract_zip(&zip_path, &temp.path().join("out"));
        assert!(matches!(result, Err(InstallerError::Integrity(_))));
    }
}
