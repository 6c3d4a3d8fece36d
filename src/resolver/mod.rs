//! Detection of the game installation root.
//!
//! Sources are tried in a fixed order and the first that validates wins:
//! the forced path, the cached root, heuristic locations, then the manual
//! picker when the caller allows it.

pub mod candidates;
pub mod infer;

pub use candidates::{default_registry_probe, NoRegistryProbe, RegQueryProbe};
pub use infer::{infer_root, validate_candidate};

use crate::config::ResolverConfig;
use crate::core::cancel::CancelToken;
use crate::core::path::{config_file, ROOT_DIR_NAME};
use crate::core::{InstallerError, InstallerResult};
use crate::di::{ManualPicker, RegistryProbe};
use crate::events::Reporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct PathResolver {
    config_path: PathBuf,
    base_dirs: Vec<PathBuf>,
    registry: Arc<dyn RegistryProbe>,
    reporter: Reporter,
}

impl PathResolver {
    /// Resolver over the per-user config and the platform's well-known folders.
    pub fn new(reporter: Reporter) -> InstallerResult<Self> {
        Ok(Self::with_parts(
            config_file()?,
            candidates::default_base_dirs(),
            Arc::from(default_registry_probe()),
            reporter,
        ))
    }

    pub fn with_parts(
        config_path: PathBuf,
        base_dirs: Vec<PathBuf>,
        registry: Arc<dyn RegistryProbe>,
        reporter: Reporter,
    ) -> Self {
        Self {
            config_path,
            base_dirs,
            registry,
            reporter,
        }
    }

    /// Resolve the installation root.
    ///
    /// An invalid forced path fails immediately without falling back. The
    /// picker is consulted only when `allow_manual` is set and every
    /// automatic source failed.
    pub async fn resolve(
        &self,
        forced: Option<&Path>,
        allow_manual: bool,
        picker: Option<&dyn ManualPicker>,
        cancel: &CancelToken,
    ) -> InstallerResult<PathBuf> {
        let this = self.clone();
        let forced_owned = forced.map(Path::to_path_buf);
        let token = cancel.clone();
        let automatic = tokio::task::spawn_blocking(move || {
            this.resolve_automatic(forced_owned.as_deref(), &token)
        })
        .await
        .map_err(|e| InstallerError::locked_with("Path detection task failed", e))??;

        if let Some(root) = automatic {
            return Ok(root);
        }

        cancel.check()?;
        if allow_manual {
            if let Some(picker) = picker {
                self.reporter.warn(format!(
                    "Could not detect {} automatically. Asking for the folder.",
                    ROOT_DIR_NAME
                ));
                if let Some(selected) = picker.pick().await {
                    let this = self.clone();
                    return tokio::task::spawn_blocking(move || this.accept_manual(&selected))
                        .await
                        .map_err(|e| InstallerError::locked_with("Path detection task failed", e))?;
                }
            }
        }

        Err(InstallerError::PathDetection(format!(
            "Could not find the {} folder. Use --path to point to it.",
            ROOT_DIR_NAME
        )))
    }

    fn resolve_automatic(
        &self,
        forced: Option<&Path>,
        cancel: &CancelToken,
    ) -> InstallerResult<Option<PathBuf>> {
        if let Some(forced) = forced.filter(|p| !p.as_os_str().is_empty()) {
            let Some(root) = validate_candidate(forced)? else {
                return Err(InstallerError::PathDetection(format!(
                    "Invalid {} path: {}",
                    ROOT_DIR_NAME,
                    forced.display()
                )));
            };
            self.reporter
                .info(format!("Using the forced path: {}", root.display()));
            self.remember(&root);
            return Ok(Some(root));
        }

        cancel.check()?;
        if let Some(cached) = ResolverConfig::load_from(&self.config_path).and_then(|c| c.last_root())
        {
            if let Some(root) = validate_candidate(&cached)? {
                self.reporter
                    .info(format!("Using the saved path: {}", root.display()));
                self.remember(&root);
                return Ok(Some(root));
            }
            tracing::debug!("Saved path {} no longer validates", cached.display());
        }

        for candidate in candidates::heuristic_candidates(&self.base_dirs, self.registry.as_ref()) {
            cancel.check()?;
            if let Some(root) = validate_candidate(&candidate)? {
                self.reporter
                    .info(format!("Detected {}: {}", ROOT_DIR_NAME, root.display()));
                self.remember(&root);
                return Ok(Some(root));
            }
        }

        Ok(None)
    }

    fn accept_manual(&self, selected: &Path) -> InstallerResult<PathBuf> {
        match validate_candidate(selected)? {
            Some(root) => {
                self.reporter
                    .info(format!("Using the selected folder: {}", root.display()));
                self.remember(&root);
                Ok(root)
            }
            None => Err(InstallerError::PathDetection(format!(
                "The selected folder is not a valid {} installation: {}",
                ROOT_DIR_NAME,
                selected.display()
            ))),
        }
    }

    /// Persist `root` for the next run. Failures are logged and ignored.
    fn remember(&self, root: &Path) {
        if let Err(e) = ResolverConfig::new(root).save_to(&self.config_path) {
            self.reporter
                .warn(format!("Could not save the detected path: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::mocks::{MockPicker, StaticRegistryProbe};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
            }
        }

        fn config_path(&self) -> PathBuf {
            self.temp.path().join("home").join("config.json")
        }

        fn resolver(&self, bases: Vec<PathBuf>, registry: Vec<PathBuf>) -> PathResolver {
            PathResolver::with_parts(
                self.config_path(),
                bases,
                Arc::new(StaticRegistryProbe(registry)),
                Reporter::silent(),
            )
        }

        fn make_root(&self, parent: &str) -> PathBuf {
            let root = self.temp.path().join(parent).join(ROOT_DIR_NAME);
            fs::create_dir_all(&root).unwrap();
            root
        }
    }

    #[tokio::test]
    async fn test_forced_path_wins() {
        let fx = Fixture::new();
        let forced = fx.make_root("forced");
        let heuristic_base = fx.temp.path().join("heuristic");
        fx.make_root("heuristic");

        let root = fx
            .resolver(vec![heuristic_base], vec![])
            .resolve(Some(&forced), false, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(root, forced);
        assert_eq!(
            ResolverConfig::load_from(&fx.config_path()).unwrap().last_root(),
            Some(forced)
        );
    }

    #[tokio::test]
    async fn test_invalid_forced_path_does_not_fall_back() {
        let fx = Fixture::new();
        let base = fx.temp.path().join("heuristic");
        fx.make_root("heuristic");
        let picker = MockPicker(Some(fx.make_root("picked")));

        let result = fx
            .resolver(vec![base], vec![])
            .resolve(
                Some(&fx.temp.path().join("missing")),
                true,
                Some(&picker),
                &CancelToken::new(),
            )
            .await;

        assert!(matches!(result, Err(InstallerError::PathDetection(_))));
        assert!(!fx.config_path().exists());
    }

    #[tokio::test]
    async fn test_cached_root_before_heuristics() {
        let fx = Fixture::new();
        let cached = fx.make_root("cached");
        ResolverConfig::new(&cached).save_to(&fx.config_path()).unwrap();
        let base = fx.temp.path().join("heuristic");
        fx.make_root("heuristic");

        let root = fx
            .resolver(vec![base], vec![])
            .resolve(None, false, None, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(root, cached);
    }

    #[tokio::test]
    async fn test_stale_cache_falls_through_to_heuristics() {
        let fx = Fixture::new();
        ResolverConfig::new(&fx.temp.path().join("gone"))
            .save_to(&fx.config_path())
            .unwrap();
        let base = fx.temp.path().join("heuristic");
        let expected = fx.make_root("heuristic");

        let root = fx
            .resolver(vec![base], vec![])
            .resolve(None, false, None, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(root, expected);
        assert_eq!(
            ResolverConfig::load_from(&fx.config_path()).unwrap().last_root(),
            Some(expected)
        );
    }

    #[tokio::test]
    async fn test_registry_candidate() {
        let fx = Fixture::new();
        let registered = fx.temp.path().join("Games").join("Epsilon");
        fs::create_dir_all(registered.join("Patches").join("Archipel")).unwrap();

        let root = fx
            .resolver(vec![fx.temp.path().join("empty")], vec![registered.clone()])
            .resolve(None, false, None, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(root, registered);
    }

    #[tokio::test]
    async fn test_manual_picker_only_when_allowed() {
        let fx = Fixture::new();
        let picked = fx.temp.path().join("Foo");
        fs::create_dir_all(picked.join("Patches").join("Archipel")).unwrap();
        let picker = MockPicker(Some(picked.join("Patches").join("Archipel")));
        let resolver = fx.resolver(vec![fx.temp.path().join("empty")], vec![]);

        let denied = resolver
            .resolve(None, false, Some(&picker), &CancelToken::new())
            .await;
        assert!(matches!(denied, Err(InstallerError::PathDetection(_))));

        let root = resolver
            .resolve(None, true, Some(&picker), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(root, picked);
    }

    #[tokio::test]
    async fn test_invalid_manual_pick_is_fatal() {
        let fx = Fixture::new();
        let plain = fx.temp.path().join("plain");
        fs::create_dir_all(&plain).unwrap();
        let picker = MockPicker(Some(plain.clone()));

        let result = fx
            .resolver(vec![fx.temp.path().join("empty")], vec![])
            .resolve(None, true, Some(&picker), &CancelToken::new())
            .await;

        match result {
            Err(InstallerError::PathDetection(message)) => {
                assert!(message.contains("not a valid"));
            }
            other => panic!("expected a path detection error, got {:?}", other),
        }
        assert!(!plain.join("Patches").exists());
        assert!(!fx.config_path().exists());
    }

    #[tokio::test]
    async fn test_dismissed_picker_is_path_error() {
        let fx = Fixture::new();
        let picker = MockPicker(None);

        let result = fx
            .resolver(vec![fx.temp.path().join("empty")], vec![])
            .resolve(None, true, Some(&picker), &CancelToken::new())
            .await;

        match result {
            Err(e) => assert_eq!(e.exit_code().code(), 3),
            Ok(root) => panic!("unexpected root {}", root.display()),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_heuristics() {
        let fx = Fixture::new();
        let base = fx.temp.path().join("heuristic");
        fx.make_root("heuristic");
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = fx.resolver(vec![base], vec![]).resolve(None, false, None, &cancel).await;
        assert!(matches!(result, Err(InstallerError::Cancelled)));
    }
}
