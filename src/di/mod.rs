//! Dependency injection infrastructure for the installer
//!
//! The engine reaches the network, the OS and the user only through the
//! traits in [`traits`], so every step can run against mocks.
//!
//! # Example (Production)
//! ```no_run
//! use archipel_installer::di::ServiceContainer;
//! use archipel_installer::events::NullSink;
//! use std::sync::Arc;
//!
//! # fn example() -> archipel_installer::core::InstallerResult<()> {
//! let container = ServiceContainer::new(Arc::new(NullSink))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example (Testing)
//! ```
//! use archipel_installer::di::mocks::{FixedDiskSpace, RecordingSleeper};
//! use archipel_installer::di::DiskSpace;
//! use std::path::Path;
//!
//! let disk = FixedDiskSpace(1024);
//! assert_eq!(disk.available_space(Path::new(".")).unwrap(), 1024);
//! let sleeper = RecordingSleeper::default();
//! assert!(sleeper.waits().is_empty());
//! ```

pub mod container;
pub mod mocks;
pub mod traits;

// Re-export key types
pub use container::ServiceContainer;
pub use traits::{BundleSource, DiskSpace, EventSink, FsOps, ManualPicker, RegistryProbe, Sleeper};
