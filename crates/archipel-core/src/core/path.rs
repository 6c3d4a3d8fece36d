use crate::core::error::{InstallerError, InstallerResult};
use std::path::{Path, PathBuf};

/// Folder name of a game installation root.
pub const ROOT_DIR_NAME: &str = "Epsilon_retail_";

/// Folder under the root that holds every patch bundle.
pub const PATCHES_DIR_NAME: &str = "Patches";

/// Folder name of the managed bundle inside `Patches`.
pub const BUNDLE_DIR_NAME: &str = "Archipel";

/// Environment variable that overrides the installer home directory.
pub const HOME_ENV_VAR: &str = "ARCHIPEL_INSTALLER_HOME";

/// Get the installer home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\ArchipelInstaller
/// - Linux: ~/.config/ArchipelInstaller
/// - macOS: ~/Library/Application Support/ArchipelInstaller
///
/// `ARCHIPEL_INSTALLER_HOME` takes precedence when set.
pub fn installer_home() -> InstallerResult<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV_VAR) {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    let config_dir = dirs::config_dir().ok_or_else(|| {
        InstallerError::locked("Could not determine the per-user configuration directory")
    })?;
    Ok(config_dir.join("ArchipelInstaller"))
}

/// Get the resolver config file path (`<home>/config.json`)
pub fn config_file() -> InstallerResult<PathBuf> {
    Ok(installer_home()?.join("config.json"))
}

/// Get the per-run log directory (`<home>/logs`)
pub fn logs_dir() -> InstallerResult<PathBuf> {
    Ok(installer_home()?.join("logs"))
}

/// Root of the scratch working directories (`<temp>/ArchipelInstaller`)
pub fn scratch_root() -> PathBuf {
    std::env::temp_dir().join("ArchipelInstaller")
}

/// `<root>/Patches`
pub fn patches_dir(root: &Path) -> PathBuf {
    root.join(PATCHES_DIR_NAME)
}

/// `<root>/Patches/Archipel`, the directory the installer owns.
pub fn bundle_dir(root: &Path) -> PathBuf {
    patches_dir(root).join(BUNDLE_DIR_NAME)
}

/// Whether `dir` directly contains `Patches/Archipel`.
pub fn has_bundle_layout(dir: &Path) -> bool {
    bundle_dir(dir).is_dir()
}

/// Final component of `path`, empty when there is none.
pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Case-insensitive comparison of the final path component.
pub fn name_matches(path: &Path, expected: &str) -> bool {
    dir_name(path).eq_ignore_ascii_case(expected)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> InstallerResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Remove a directory tree if it is present
pub fn remove_dir_if_exists(path: &Path) -> InstallerResult<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Normalize a relative path to forward slashes.
pub fn normalize_relative(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
