//! Conflict detection rule
//!
//! A write is admissible only if the version it presents equals the record's
//! current version. Timestamps and field values are never consulted: clocks
//! skew, and two different histories can arrive at equal field values.
//!
//! Stores call [`check`] inside their compare-and-set critical section; the
//! retry controller calls it to short-circuit writes it already knows are
//! stale.

use crate::record::Record;
use crate::types::Version;

/// Verdict of comparing a presented version against the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCheck {
    /// Presented version is current
    Current,
    /// Presented version is stale
    Stale {
        /// Version the writer presented
        expected: Version,
        /// Version the record actually has
        actual: Version,
    },
}

impl ConflictCheck {
    /// Whether the write may proceed
    pub fn is_current(&self) -> bool {
        matches!(self, ConflictCheck::Current)
    }
}

/// Compare a presented version against the current record
#[inline]
pub fn check(expected: Version, current: &Record) -> ConflictCheck {
    if current.version == expected {
        ConflictCheck::Current
    } else {
        ConflictCheck::Stale {
            expected,
            actual: current.version,
        }
    }
}
