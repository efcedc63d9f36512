//! Service Layer Error Types
//!
//! One taxonomy covers every failure an export or import item can hit. The
//! batch orchestrator records these per item; only `InvalidRequest` ever
//! escapes a batch call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Export/import errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Page or content missing on the remote side
    #[error("Page not found: {id}")]
    NotFound { id: String },

    /// External service or network failure, including timeouts
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Input the transcoder refuses to interpret
    #[error("Conversion failed: {0}")]
    ConversionFailure(String),

    /// Front matter or content problems found before import
    #[error("Validation failed: {}", issues.join("; "))]
    ValidationFailure { issues: Vec<String> },

    /// Write refused by the remote service (e.g. schema mismatch)
    #[error("Remote rejected write: {0}")]
    RemoteRejected(String),

    /// The batch request itself is malformed
    #[error("Invalid batch request: {0}")]
    InvalidRequest(String),
}

/// Serializable discriminant of [`SyncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    Unavailable,
    ConversionFailure,
    ValidationFailure,
    RemoteRejected,
    InvalidRequest,
}

impl SyncError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn conversion_failure(msg: impl Into<String>) -> Self {
        Self::ConversionFailure(msg.into())
    }

    pub fn validation_failure(issues: Vec<String>) -> Self {
        Self::ValidationFailure { issues }
    }

    pub fn remote_rejected(msg: impl Into<String>) -> Self {
        Self::RemoteRejected(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Timeout of an external call, reported as unavailability
    pub fn timed_out(operation: &str, timeout: std::time::Duration) -> Self {
        Self::Unavailable(format!(
            "{} timed out after {}s",
            operation,
            timeout.as_secs_f64()
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::ConversionFailure(_) => ErrorKind::ConversionFailure,
            Self::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            Self::RemoteRejected(_) => ErrorKind::RemoteRejected,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}
