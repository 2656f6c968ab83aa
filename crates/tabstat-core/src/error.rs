//! Error types for `tabstat`.
//!
//! A single error enum covers storage, ingestion and pipeline failures.
//! Error codes follow the pattern `TABSTAT-XXX` so that log lines and CLI
//! output can be grepped without parsing the message.

use thiserror::Error;

/// Result type alias for `tabstat` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `tabstat` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The storage directory could not be opened or created (TABSTAT-001).
    #[error("[TABSTAT-001] Cannot connect to store at '{path}': {reason}")]
    Connection {
        /// Location that failed to open.
        path: String,
        /// Underlying cause.
        reason: String,
    },

    /// Collection not found (TABSTAT-002).
    #[error("[TABSTAT-002] Collection '{0}' not found")]
    CollectionNotFound(String),

    /// An upstream summary document is absent (TABSTAT-003).
    ///
    /// Raised when a stage runs before the stage that produces its input,
    /// e.g. partitioning before statistics were aggregated.
    #[error("[TABSTAT-003] Prerequisite not found: {0}")]
    PrerequisiteNotFound(String),

    /// Storage error (TABSTAT-004).
    #[error("[TABSTAT-004] Storage error: {0}")]
    Storage(String),

    /// IO error (TABSTAT-005).
    #[error("[TABSTAT-005] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (TABSTAT-006).
    #[error("[TABSTAT-006] Serialization error: {0}")]
    Serialization(String),

    /// CSV parsing error (TABSTAT-007).
    #[error("[TABSTAT-007] CSV error: {0}")]
    Csv(String),

    /// Configuration error (TABSTAT-008).
    #[error("[TABSTAT-008] Configuration error: {0}")]
    Config(String),

    /// Schema validation error (TABSTAT-009).
    #[error("[TABSTAT-009] Schema validation error: {0}")]
    SchemaValidation(String),

    /// Internal error (TABSTAT-010).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[TABSTAT-010] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "TABSTAT-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "TABSTAT-001",
            Self::CollectionNotFound(_) => "TABSTAT-002",
            Self::PrerequisiteNotFound(_) => "TABSTAT-003",
            Self::Storage(_) => "TABSTAT-004",
            Self::Io(_) => "TABSTAT-005",
            Self::Serialization(_) => "TABSTAT-006",
            Self::Csv(_) => "TABSTAT-007",
            Self::Config(_) => "TABSTAT-008",
            Self::SchemaValidation(_) => "TABSTAT-009",
            Self::Internal(_) => "TABSTAT-010",
        }
    }

    /// Returns true if retrying the operation after fixing input could succeed.
    ///
    /// Connection failures and internal errors abort the pipeline outright.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Connection { .. } | Self::Internal(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
