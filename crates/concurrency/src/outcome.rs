//! Terminal outcomes of an update request
//!
//! Every request ends in exactly one of:
//!
//! | Outcome | Retried? | Written? |
//! |---------|----------|----------|
//! | [`Committed`] | - | yes |
//! | [`UpdateError::NotFound`] | never | no |
//! | [`UpdateError::VersionConflict`] | never (snapshot changes) | no |
//! | [`UpdateError::RetryExhausted`] | bound reached (delta changes) | no |
//! | [`UpdateError::ValidationFailed`] | never | no |
//! | [`UpdateError::Cancelled`] | never | no |
//! | [`UpdateError::Storage`] | never | unknown to caller |
//!
//! Conflict outcomes carry a [`ConflictReport`] with the current version and
//! fields, enough for a caller to re-render and let the end user resubmit.

use crate::cancel::CancelReason;
use crate::validation::ValidationError;
use occstore_core::{Record, RecordId, StoreError, Version};
use serde::Serialize;
use thiserror::Error;

/// Successful update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Committed {
    /// The new committed state, including its new version
    pub record: Record,
    /// Number of conditional writes issued, this one included
    pub attempts: u32,
}

/// Details of a lost race
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictReport {
    /// Record the request targeted
    pub id: RecordId,
    /// Version the last attempt presented
    pub expected: Version,
    /// Current committed state
    pub current: Record,
    /// Number of attempts made
    pub attempts: u32,
}

impl ConflictReport {
    /// Current version of the record
    pub fn current_version(&self) -> Version {
        self.current.version
    }
}

/// Terminal failure of an update request
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum UpdateError {
    /// No record with this id
    #[error("record {id} not found")]
    NotFound {
        /// Requested id
        id: RecordId,
    },

    /// Caller's snapshot is stale
    #[error(
        "record {} was modified (expected version {}, current {}); refresh and retry",
        .0.id, .0.expected, .0.current.version
    )]
    VersionConflict(ConflictReport),

    /// Delta update lost every race up to the retry bound
    #[error(
        "record {} still contended after {} attempts (current version {})",
        .0.id, .0.attempts, .0.current.version
    )]
    RetryExhausted(ConflictReport),

    /// Candidate state violates a domain invariant
    #[error("record {id}: {reason}")]
    ValidationFailed {
        /// Requested id
        id: RecordId,
        /// Violated invariant
        reason: ValidationError,
    },

    /// Request withdrawn before completion
    #[error("update of record {id} abandoned after {attempts} attempts: {reason}")]
    Cancelled {
        /// Requested id
        id: RecordId,
        /// Writes issued before cancellation
        attempts: u32,
        /// Signal or deadline
        reason: CancelReason,
    },

    /// Backend failure
    #[error("storage failure: {source}")]
    Storage {
        /// Underlying store error
        #[from]
        #[serde(serialize_with = "serialize_display")]
        source: StoreError,
    },
}

impl UpdateError {
    /// Whether this is a lost race (stale snapshot or exhausted retries)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            UpdateError::VersionConflict(_) | UpdateError::RetryExhausted(_)
        )
    }

    /// Whether resubmitting at a higher level may succeed
    ///
    /// True for conflicts only: the caller should re-read, re-render and let
    /// the end user decide.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Whether the record was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpdateError::NotFound { .. })
    }

    /// The conflict report, if this is a conflict
    pub fn conflict(&self) -> Option<&ConflictReport> {
        match self {
            UpdateError::VersionConflict(report) | UpdateError::RetryExhausted(report) => {
                Some(report)
            }
            _ => None,
        }
    }

    /// Current committed state, when the outcome carries it
    pub fn current_record(&self) -> Option<&Record> {
        self.conflict().map(|report| &report.current)
    }
}

fn serialize_display<S: serde::Serializer>(err: &StoreError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Result of an update request
pub type UpdateResult = std::result::Result<Committed, UpdateError>;
