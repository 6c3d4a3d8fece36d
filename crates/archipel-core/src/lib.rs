//! Core utilities shared by the Archipel installer: the failure taxonomy
//! with its exit codes, and the platform and bundle-layout paths.

pub mod core {
    pub mod error;
    pub mod path;

    pub use error::{InstallerError, InstallerExitCode, InstallerResult};
}

pub use crate::core::error::{InstallerError, InstallerExitCode, InstallerResult};
