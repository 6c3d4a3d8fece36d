use crate::core::path::{config_file, ensure_dir};
use crate::core::{InstallerError, InstallerResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolver cache persisted between runs.
///
/// Advisory only: a cached root that no longer validates is ignored and
/// detection carries on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Last installation root that resolved successfully
    #[serde(
        rename = "lastEpsilonRoot",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_epsilon_root: Option<String>,
}

impl ResolverConfig {
    pub fn new(root: &Path) -> Self {
        Self {
            last_epsilon_root: Some(root.to_string_lossy().into_owned()),
        }
    }

    /// Load the config from the per-user location
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\ArchipelInstaller\config.json
    /// - Linux: ~/.config/ArchipelInstaller/config.json
    /// - macOS: ~/Library/Application Support/ArchipelInstaller/config.json
    pub fn load() -> Option<Self> {
        Self::load_from(&config_file().ok()?)
    }

    /// Read `path`, returning `None` when it is missing or unreadable.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::debug!("Ignoring unreadable config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Save the config to the per-user location
    pub fn save(&self) -> InstallerResult<()> {
        self.save_to(&config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> InstallerResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| InstallerError::locked("Invalid config path"))?;
        ensure_dir(dir)?;

        let content = serde_json::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn last_root(&self) -> Option<PathBuf> {
        self.last_epsilon_root
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}
