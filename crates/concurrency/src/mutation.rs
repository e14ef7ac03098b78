//! Mutation applier
//!
//! Computes a candidate field set from the current record and a requested
//! [`Change`]. Pure: no store access, no side effects, safe to call once per
//! retry attempt.
//!
//! Two families of change exist:
//!
//! - **Snapshot changes** ([`Change::Replace`], [`Change::Patch`]) were
//!   computed by the caller from a version it already read. Re-applying them
//!   to newer state could discard a concurrent writer's intent, so a conflict
//!   is surfaced to the caller instead of retried.
//! - **Delta changes** ([`Change::Adjust`]) are expressed relative to current
//!   state and are recomputed from a fresh read on every attempt.

use crate::validation::ValidationError;
use occstore_core::{Fields, Record, Value};
use serde::{Deserialize, Serialize};

/// Relative adjustment of an integer field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Field to adjust
    pub field: String,
    /// Signed amount to add
    pub delta: i64,
}

impl Adjustment {
    /// Add `delta` to `field`
    pub fn new(field: impl Into<String>, delta: i64) -> Self {
        Self {
            field: field.into(),
            delta,
        }
    }
}

/// A requested change to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "change", rename_all = "snake_case")]
pub enum Change {
    /// Replace every field with this set
    Replace(Fields),
    /// Overwrite only the given fields, keep the rest
    Patch(Fields),
    /// Add a delta to an integer field
    Adjust(Adjustment),
}

impl Change {
    /// Shorthand for [`Change::Adjust`]
    pub fn adjust(field: impl Into<String>, delta: i64) -> Self {
        Change::Adjust(Adjustment::new(field, delta))
    }

    /// Whether a version conflict may be resolved by re-reading and re-applying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Change::Adjust(_))
    }

    /// Short label for logs
    pub fn mode(&self) -> &'static str {
        match self {
            Change::Replace(_) => "replace",
            Change::Patch(_) => "patch",
            Change::Adjust(_) => "adjust",
        }
    }

    /// Compute the candidate fields for `current`
    ///
    /// Domain constraints are NOT checked here; see
    /// [`Constraints::validate`](crate::validation::Constraints::validate).
    pub fn apply(&self, current: &Record) -> Result<Fields, ValidationError> {
        match self {
            Change::Replace(fields) => Ok(fields.clone()),
            Change::Patch(patch) => {
                let mut fields = current.fields.clone();
                fields.merge(patch);
                Ok(fields)
            }
            Change::Adjust(adj) => apply_adjustment(adj, &current.fields),
        }
    }
}

fn apply_adjustment(adj: &Adjustment, fields: &Fields) -> Result<Fields, ValidationError> {
    let value = fields
        .get(&adj.field)
        .ok_or_else(|| ValidationError::MissingField {
            field: adj.field.clone(),
        })?;
    let current = value.as_int().ok_or_else(|| ValidationError::WrongType {
        field: adj.field.clone(),
        expected: "Int",
        actual: value.type_name(),
    })?;
    let next = current
        .checked_add(adj.delta)
        .ok_or_else(|| ValidationError::Overflow {
            field: adj.field.clone(),
            delta: adj.delta,
        })?;

    let mut out = fields.clone();
    out.insert(adj.field.clone(), Value::Int(next));
    Ok(out)
}
