//! Service container for dependency injection

use super::traits::{BundleSource, EventSink};
use crate::core::InstallerResult;
use crate::events::Reporter;
use crate::install::AtomicInstaller;
use crate::remote::GitHubBundleSource;
use crate::resolver::PathResolver;
use crate::updater::Updater;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds the services one update needs behind trait objects so tests can
/// swap the remote side or the filesystem for mocks.
///
/// # Example (Production)
///
/// ```no_run
/// use archipel_installer::di::ServiceContainer;
/// use archipel_installer::events::NullSink;
/// use std::sync::Arc;
///
/// # fn example() -> archipel_installer::core::InstallerResult<()> {
/// let container = ServiceContainer::new(Arc::new(NullSink))?;
/// let updater = container.updater();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ServiceContainer {
    pub reporter: Reporter,
    pub source: Arc<dyn BundleSource>,
    pub resolver: PathResolver,
    pub installer: AtomicInstaller,
}

impl ServiceContainer {
    /// Create a container with the production implementations
    ///
    /// Every event of the run is delivered to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP client cannot be built
    /// - The per-user application folder cannot be determined
    pub fn new(sink: Arc<dyn EventSink>) -> InstallerResult<Self> {
        let reporter = Reporter::new(sink);
        Ok(Self {
            source: Arc::new(GitHubBundleSource::new(reporter.clone())?),
            resolver: PathResolver::new(reporter.clone())?,
            installer: AtomicInstaller::new(reporter.clone()),
            reporter,
        })
    }

    /// Create a container with custom services (for testing)
    pub fn with_services(
        reporter: Reporter,
        source: Arc<dyn BundleSource>,
        resolver: PathResolver,
        installer: AtomicInstaller,
    ) -> Self {
        Self {
            reporter,
            source,
            resolver,
            installer,
        }
    }

    pub fn updater(&self) -> Updater {
        Updater::new(
            self.source.clone(),
            self.resolver.clone(),
            self.installer.clone(),
            self.reporter.clone(),
        )
    }
}
