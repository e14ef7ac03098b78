//! Domain invariant validation
//!
//! Every candidate state is validated BEFORE any write is issued. A failed
//! validation is terminal: it is never written and never consumes a retry.

use occstore_core::Fields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a candidate state was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Integer field fell below its minimum
    #[error("field '{field}' would be {value}, below minimum {minimum}")]
    BelowMinimum {
        /// Field name
        field: String,
        /// Value the change would produce
        value: i64,
        /// Configured minimum
        minimum: i64,
    },

    /// Required field missing or null
    #[error("field '{field}' is required")]
    MissingField {
        /// Field name
        field: String,
    },

    /// Field has the wrong type for the operation
    #[error("field '{field}' is {actual}, expected {expected}")]
    WrongType {
        /// Field name
        field: String,
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        actual: &'static str,
    },

    /// Arithmetic on a field overflowed
    #[error("adjusting field '{field}' by {delta} overflows")]
    Overflow {
        /// Field name
        field: String,
        /// Requested delta
        delta: i64,
    },
}

/// Domain invariants checked on every candidate state
///
/// # Example
///
/// ```
/// use occstore_concurrency::Constraints;
/// use occstore_core::Fields;
///
/// let constraints = Constraints::new().min("stock", 0).require("name");
/// assert!(constraints.validate(&Fields::new().with("name", "Hub").with("stock", 3)).is_ok());
/// assert!(constraints.validate(&Fields::new().with("name", "Hub").with("stock", -1)).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Inclusive lower bound per integer field
    #[serde(default)]
    minimums: BTreeMap<String, i64>,
    /// Fields that must be present and non-null
    #[serde(default)]
    required: Vec<String>,
}

impl Constraints {
    /// No constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to stay at or above `minimum` when it is an integer
    pub fn min(mut self, field: impl Into<String>, minimum: i64) -> Self {
        self.minimums.insert(field.into(), minimum);
        self
    }

    /// Require `field` to be present and non-null
    pub fn require(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    /// Configured minimum for a field
    pub fn minimum(&self, field: &str) -> Option<i64> {
        self.minimums.get(field).copied()
    }

    /// Whether any constraint is configured
    pub fn is_empty(&self) -> bool {
        self.minimums.is_empty() && self.required.is_empty()
    }

    /// Check a candidate state against every constraint
    pub fn validate(&self, fields: &Fields) -> Result<(), ValidationError> {
        for field in &self.required {
            match fields.get(field) {
                Some(value) if !value.is_null() => {}
                _ => {
                    return Err(ValidationError::MissingField {
                        field: field.clone(),
                    })
                }
            }
        }

        for (field, &minimum) in &self.minimums {
            let Some(value) = fields.get(field) else {
                continue;
            };
            match value.as_int() {
                Some(n) if n < minimum => {
                    return Err(ValidationError::BelowMinimum {
                        field: field.clone(),
                        value: n,
                        minimum,
                    })
                }
                Some(_) => {}
                None if value.is_null() => {}
                None => {
                    return Err(ValidationError::WrongType {
                        field: field.clone(),
                        expected: "Int",
                        actual: value.type_name(),
                    })
                }
            }
        }

        Ok(())
    }
}
