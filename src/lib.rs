//! Archipel installer
//!
//! Keeps the Archipel patch bundle of an Epsilon installation in sync with
//! the copy published on GitHub. The local and remote file sets are
//! compared by content hash; the bundle is downloaded only when they differ
//! and is swapped into place with backup and rollback.

pub use archipel_core::{InstallerError, InstallerExitCode, InstallerResult};

/// Core module: errors and paths from `archipel-core`, plus cancellation and
/// directory helpers.
pub mod core;

/// Persisted resolver cache.
pub mod config;

/// Progress and log events.
pub mod events;

/// Content digests.
pub mod hash;

/// Local manifests and manifest comparison.
pub mod manifest;

/// HTTP with retry and backoff.
pub mod transport;

/// Remote manifest and bundle archive.
pub mod remote;

/// Installation root detection.
pub mod resolver;

/// Atomic swap of the installed bundle.
pub mod install;

/// End-to-end update orchestration.
pub mod updater;

/// Dependency injection.
pub mod di;
