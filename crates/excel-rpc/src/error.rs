//! Error types raised by adapters and method handlers.
//!
//! Everything that can go wrong below the dispatcher is a [`HostError`]. The
//! dispatcher is the only place that turns one into a wire error; see
//! [`crate::mapper`].

use std::fmt;
use std::io;

use thiserror::Error;

/// The kind of host object a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    App,
    Workbook,
    Sheet,
    Chart,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::App => "application",
            Target::Workbook => "workbook",
            Target::Sheet => "sheet",
            Target::Chart => "chart",
        };
        write!(f, "{name}")
    }
}

/// Failures raised by the automation layer.
#[derive(Debug, Error)]
pub enum HostError {
    /// The automation binding itself reported an error.
    #[error("{0}")]
    Automation(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("{message}")]
    NotFound { target: Target, message: String },

    /// Malformed or out-of-bounds cell address.
    #[error("{0}")]
    Range(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HostError {
    pub fn not_found(target: Target, message: impl Into<String>) -> Self {
        HostError::NotFound {
            target,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        HostError::InvalidArgument(message.into())
    }

    /// Short machine-readable name of the variant, used in error diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HostError::Automation(_) => "automation",
            HostError::Connection(_) => "connection",
            HostError::FileNotFound(_) => "file_not_found",
            HostError::InvalidArgument(_) => "invalid_argument",
            HostError::PermissionDenied(_) => "permission_denied",
            HostError::Timeout(_) => "timeout",
            HostError::NotFound { .. } => "not_found",
            HostError::Range(_) => "range",
            HostError::Other(_) => "other",
        }
    }
}

impl From<io::Error> for HostError {
    fn from(err: io::Error) -> Self {
        let text = err.to_string();
        match err.kind() {
            io::ErrorKind::NotFound => HostError::FileNotFound(text),
            io::ErrorKind::PermissionDenied => HostError::PermissionDenied(text),
            io::ErrorKind::TimedOut => HostError::Timeout(text),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => HostError::Connection(text),
            _ => HostError::Other(err.into()),
        }
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;
