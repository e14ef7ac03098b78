//! Storage backend errors
//!
//! Version mismatches and missing records are NOT errors: they are ordinary
//! [`WriteOutcome`](crate::traits::WriteOutcome) variants. `StoreError` covers
//! the backend itself failing.

use thiserror::Error;

/// Failure of the storage backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend returned data that violates the store contract
    #[error("store corruption: {0}")]
    Corruption(String),

    /// Identifier or version space exhausted
    #[error("{0} counter exhausted")]
    Exhausted(&'static str),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
