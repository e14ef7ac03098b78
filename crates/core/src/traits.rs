//! The record store contract
//!
//! Any backend offering an atomic version-gated write can implement
//! [`RecordStore`]: a relational table with a version column in the UPDATE
//! predicate, a key-value store with CAS, or an in-memory map with per-key
//! locking.
//!
//! ## Contract
//!
//! - `read` never blocks behind a conditional write for longer than the write
//!   itself, and never observes a half-applied write.
//! - `conditional_write` and `delete` compare and mutate as ONE indivisible
//!   step per record. Of all writers racing against the same version, at most
//!   one observes [`WriteOutcome::Committed`].
//! - Every commit assigns a version never used before for that record.
//! - Nothing else may change a record's version.

use crate::error::Result;
use crate::record::Record;
use crate::types::{RecordId, Version};
use crate::value::Fields;
use serde::Serialize;
use std::sync::Arc;

/// Result of a version-gated mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The mutation committed
    ///
    /// For writes this is the new state. For deletes it is the final state
    /// that was removed.
    Committed(Record),

    /// The record exists under a different version
    ///
    /// Carries the CURRENT record so callers can decide whether to retry
    /// without another read.
    VersionMismatch(Record),

    /// No record with this id exists
    NotFound,
}

impl WriteOutcome {
    /// Whether the mutation committed
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed(_))
    }

    /// Whether the mutation was rejected for a stale version
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, WriteOutcome::VersionMismatch(_))
    }

    /// Whether the record was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, WriteOutcome::NotFound)
    }

    /// The record carried by this outcome, if any
    pub fn record(&self) -> Option<&Record> {
        match self {
            WriteOutcome::Committed(r) | WriteOutcome::VersionMismatch(r) => Some(r),
            WriteOutcome::NotFound => None,
        }
    }
}

/// Storage backend with version-gated writes
pub trait RecordStore: Send + Sync {
    /// Current committed state of a record
    fn read(&self, id: RecordId) -> Result<Option<Record>>;

    /// Insert a new record with a fresh id and initial version
    fn create(&self, fields: Fields) -> Result<Record>;

    /// Replace a record's fields if its version still equals `expected`
    fn conditional_write(
        &self,
        id: RecordId,
        expected: Version,
        fields: Fields,
    ) -> Result<WriteOutcome>;

    /// Remove a record if its version still equals `expected`
    fn delete(&self, id: RecordId, expected: Version) -> Result<WriteOutcome>;

    /// All records, ordered by id
    fn list(&self) -> Result<Vec<Record>>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn read(&self, id: RecordId) -> Result<Option<Record>> {
        (**self).read(id)
    }

    fn create(&self, fields: Fields) -> Result<Record> {
        (**self).create(fields)
    }

    fn conditional_write(
        &self,
        id: RecordId,
        expected: Version,
        fields: Fields,
    ) -> Result<WriteOutcome> {
        (**self).conditional_write(id, expected, fields)
    }

    fn delete(&self, id: RecordId, expected: Version) -> Result<WriteOutcome> {
        (**self).delete(id, expected)
    }

    fn list(&self) -> Result<Vec<Record>> {
        (**self).list()
    }
}
