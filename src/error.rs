//! Unified error type for occstore.
//!
//! Wraps the layered errors of the workspace crates and presents one
//! interface to users, while keeping the current record attached to every
//! conflict so a caller can re-render and let the end user resubmit.

use occstore_concurrency::{CancelReason, ConflictReport, UpdateError, ValidationError};
use occstore_core::{Record, RecordId, StoreError};
use thiserror::Error;

/// All occstore errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Record not found
    #[error("not found: record {0}")]
    NotFound(RecordId),

    /// Caller's snapshot is stale
    #[error(
        "conflict: record {} changed (expected version {}, current {})",
        .0.id, .0.expected, .0.current.version
    )]
    Conflict(ConflictReport),

    /// Delta update still contended after the retry bound
    #[error(
        "conflict: record {} still contended after {} attempts",
        .0.id, .0.attempts
    )]
    RetryExhausted(ConflictReport),

    /// Candidate state violates a domain constraint
    #[error("validation failed: {reason}")]
    Validation {
        /// Target record, `None` for a create
        id: Option<RecordId>,
        /// Violated constraint
        reason: ValidationError,
    },

    /// Request abandoned by signal or deadline
    #[error("cancelled after {attempts} attempts: {reason}")]
    Cancelled {
        /// Writes issued before cancellation
        attempts: u32,
        /// Signal or deadline
        reason: CancelReason,
    },

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for occstore operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Only conflicts are: a higher layer may re-read and resubmit.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_) | Error::RetryExhausted(_))
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Conflict details, if this is a conflict.
    pub fn conflict(&self) -> Option<&ConflictReport> {
        match self {
            Error::Conflict(report) | Error::RetryExhausted(report) => Some(report),
            _ => None,
        }
    }

    /// Current committed state attached to a conflict.
    pub fn current_record(&self) -> Option<&Record> {
        self.conflict().map(|report| &report.current)
    }
}

impl From<UpdateError> for Error {
    fn from(e: UpdateError) -> Self {
        match e {
            UpdateError::NotFound { id } => Error::NotFound(id),
            UpdateError::VersionConflict(report) => Error::Conflict(report),
            UpdateError::RetryExhausted(report) => Error::RetryExhausted(report),
            UpdateError::ValidationFailed { id, reason } => Error::Validation {
                id: Some(id),
                reason,
            },
            UpdateError::Cancelled {
                attempts, reason, ..
            } => Error::Cancelled { attempts, reason },
            UpdateError::Storage { source } => Error::Storage(source),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
