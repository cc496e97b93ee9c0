//! Unified error handling for the launchscope crate
//!
//! Domain errors stay close to where they are raised ([`AnalyticsError`] in
//! the pure core, [`StorageError`] in the repositories). Pipelines surface
//! both through the single [`Error`] enum defined here.
//!
//! # Usage
//!
//! ```rust,ignore
//! use launchscope::error::{Error, ErrorCategory, LaunchscopeErrorTrait};
//!
//! fn report(err: &Error) {
//!     match err.category() {
//!         ErrorCategory::Data => eprintln!("Bad input data: {err}"),
//!         _ => eprintln!("Failed: {err}"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::analytics::AnalyticsError;
pub use crate::storage::StorageError;

/// Common trait for launchscope error types
pub trait LaunchscopeErrorTrait: std::error::Error {
    /// Whether retrying the same operation could succeed
    fn is_recoverable(&self) -> bool;

    /// Error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input data (timestamps, JSON payloads, metrics)
    Data,
    /// Database and file access errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LaunchscopeErrorTrait for AnalyticsError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Data
    }
}

impl LaunchscopeErrorTrait for StorageError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Json { .. } | Self::CategoryLabels { .. } | Self::NegativeMetric { .. } => {
                ErrorCategory::Data
            }
            Self::Sqlite(_) | Self::Io { .. } | Self::LockPoisoned => ErrorCategory::Storage,
        }
    }
}

/// Unified error type for the launchscope crate
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid data reaching the analytics core
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Repository errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LaunchscopeErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Analytics(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Analytics(e) => e.category(),
            Self::Storage(e) => e.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Data,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: format!("{err:#}"),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
