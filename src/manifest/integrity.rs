use crate::core::fs::list_files;
use crate::core::{InstallerError, InstallerResult};
use std::path::Path;

/// Check an extracted bundle before it is swapped in.
///
/// The directory must exist, hold at least one file, and hold no empty file.
pub fn validate_extracted_bundle(bundle: &Path) -> InstallerResult<()> {
    if !bundle.is_dir() {
        return Err(InstallerError::Integrity(format!(
            "Extracted bundle directory not found: {}",
            bundle.display()
        )));
    }

    let files = list_files(bundle)?;
    if files.is_empty() {
        return Err(InstallerError::Integrity(format!(
            "Extracted bundle is empty: {}",
            bundle.display()
        )));
    }

    for file in &files {
        if file.metadata()?.len() == 0 {
            return Err(InstallerError::Integrity(format!(
                "Empty file in extracted bundle: {}",
                file.path().display()
            )));
        }
    }

    Ok(())
}
