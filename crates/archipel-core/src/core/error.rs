use std::fmt;
use thiserror::Error;

pub type InstallerResult<T> = Result<T, InstallerError>;

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Process exit status of one installer run.
///
/// The numeric values are a stable contract for automation reading the
/// process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InstallerExitCode {
    Success = 0,
    NetworkError = 1,
    PermissionOrLockedError = 2,
    PathDetectionError = 3,
    IntegrityError = 4,
}

impl InstallerExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == InstallerExitCode::Success
    }
}

impl fmt::Display for InstallerExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallerExitCode::Success => "Success",
            InstallerExitCode::NetworkError => "NetworkError",
            InstallerExitCode::PermissionOrLockedError => "PermissionOrLockedError",
            InstallerExitCode::PathDetectionError => "PathDetectionError",
            InstallerExitCode::IntegrityError => "IntegrityError",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

impl From<InstallerExitCode> for i32 {
    fn from(code: InstallerExitCode) -> Self {
        code.code()
    }
}

impl From<InstallerExitCode> for std::process::ExitCode {
    fn from(code: InstallerExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[derive(Error, Debug)]
pub enum InstallerError {
    /// Remote fetch exhausted its retries or got a non-retryable status.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// Filesystem access denied or locked, usually because the game is running.
    #[error("{message}")]
    PermissionOrLocked {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    #[error("{0}")]
    PathDetection(String),

    #[error("{0}")]
    Integrity(String),

    /// Cooperative cancellation. Not one of the reportable failure classes.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl InstallerError {
    pub fn network(message: impl Into<String>) -> Self {
        InstallerError::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        InstallerError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn locked(message: impl Into<String>) -> Self {
        InstallerError::PermissionOrLocked {
            message: message.into(),
            source: None,
        }
    }

    pub fn locked_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        InstallerError::PermissionOrLocked {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, InstallerError::Cancelled)
    }

    /// Map the error onto the closed exit-code set.
    ///
    /// Anything that is not explicitly classified lands in
    /// `PermissionOrLockedError`, the catch-all class.
    pub fn exit_code(&self) -> InstallerExitCode {
        match self {
            InstallerError::Network { .. } | InstallerError::Http(_) | InstallerError::Json(_) => {
                InstallerExitCode::NetworkError
            }
            InstallerError::PathDetection(_) => InstallerExitCode::PathDetectionError,
            InstallerError::Integrity(_) => InstallerExitCode::IntegrityError,
            InstallerError::PermissionOrLocked { .. }
            | InstallerError::Cancelled
            | InstallerError::Io(_)
            | InstallerError::WalkDir(_) => InstallerExitCode::PermissionOrLockedError,
        }
    }

    /// Message followed by the chain of underlying causes.
    pub fn detailed(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
