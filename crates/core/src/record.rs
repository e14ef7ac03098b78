//! Versioned record type
//!
//! Records are the unit of optimistic concurrency: the `(fields, version)`
//! pair only ever changes together, inside a store's conditional write.

use crate::types::{RecordId, Timestamp, Version};
use crate::value::Fields;
use serde::{Deserialize, Serialize};

/// A committed record snapshot
///
/// Values of this type are read models. Mutating a `Record` obtained from a
/// store has no effect on the store; all changes go through
/// [`RecordStore::conditional_write`](crate::traits::RecordStore::conditional_write).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier
    pub id: RecordId,
    /// Mutable payload
    pub fields: Fields,
    /// Version token of this committed state
    pub version: Version,
    /// Creation time (advisory)
    pub created_at: Timestamp,
    /// Time of the last committed update (advisory, `None` until first update)
    pub last_modified: Option<Timestamp>,
}

impl Record {
    /// Build a freshly created record
    pub fn new(id: RecordId, fields: Fields, version: Version) -> Self {
        Self {
            id,
            fields,
            version,
            created_at: chrono::Utc::now(),
            last_modified: None,
        }
    }

    /// Produce the successor state of this record
    ///
    /// Used by stores when a conditional write commits. The id and creation
    /// time carry over; fields and version are replaced together.
    pub fn successor(&self, fields: Fields, version: Version) -> Self {
        Self {
            id: self.id,
            fields,
            version,
            created_at: self.created_at,
            last_modified: Some(chrono::Utc::now()),
        }
    }
}
