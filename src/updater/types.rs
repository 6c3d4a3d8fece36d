use crate::core::{InstallerError, InstallerExitCode};
use std::path::PathBuf;
use thiserror::Error;

/// Options of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerOptions {
    /// Headless: no prompts, outcome through the log and exit code only
    pub silent: bool,
    /// Detect and compare, never write to the installation
    pub dry_run: bool,
    /// Front-end hint to stay open after success; ignored by the engine
    pub no_close: bool,
    /// Installation root given by the caller, bypassing detection
    pub forced_path: Option<PathBuf>,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub exit_code: InstallerExitCode,
    pub message: String,
    /// Success without any change because the installation already matched
    pub already_up_to_date: bool,
}

impl InstallResult {
    pub fn up_to_date(message: impl Into<String>) -> Self {
        Self {
            exit_code: InstallerExitCode::Success,
            message: message.into(),
            already_up_to_date: true,
        }
    }

    pub fn updated(message: impl Into<String>) -> Self {
        Self {
            exit_code: InstallerExitCode::Success,
            message: message.into(),
            already_up_to_date: false,
        }
    }

    pub fn failure(error: &InstallerError) -> Self {
        Self {
            exit_code: error.exit_code(),
            message: error.to_string(),
            already_up_to_date: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code.is_success()
    }
}

/// The run was cancelled before it produced a result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation cancelled")]
pub struct Cancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_exit_code() {
        let result = InstallResult::failure(&InstallerError::Integrity("empty bundle".into()));
        assert_eq!(result.exit_code, InstallerExitCode::IntegrityError);
        assert_eq!(result.message, "empty bundle");
        assert!(!result.is_success());
        assert!(!result.already_up_to_date);
    }

    #[test]
    fn test_success_variants() {
        assert!(InstallResult::up_to_date("ok").already_up_to_date);
        assert!(!InstallResult::updated("ok").already_up_to_date);
        assert!(InstallResult::updated("ok").is_success());
    }
}
