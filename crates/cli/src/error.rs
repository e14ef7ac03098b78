//! CLI error type.

use occstore::RecordId;
use thiserror::Error;

/// Errors surfaced by the scenario runners.
#[derive(Debug, Error)]
pub enum CliError {
    /// Database operation failed
    #[error(transparent)]
    Store(#[from] occstore::Error),

    /// Catalog position out of range
    #[error("product must be between 1 and {count}, got {product}")]
    ProductOutOfRange { product: usize, count: usize },

    /// Contended record was removed while the scenario ran
    #[error("record {0} vanished")]
    Vanished(RecordId),

    /// A worker thread panicked
    #[error("worker thread panicked")]
    WorkerPanicked,

    /// Report could not be rendered
    #[error("render report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for the CLI.
pub type Result<T> = std::result::Result<T, CliError>;
