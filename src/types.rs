//! Public types for the occstore API.
//!
//! Re-exports types from the workspace crates with one import path.

// Record model
pub use occstore_core::{Fields, Record, RecordId, Timestamp, Value, Version};

// Store seam
pub use occstore_core::{RecordStore, StoreError, WriteOutcome};

// Update pipeline
pub use occstore_concurrency::{
    Adjustment, CancelReason, CancellationToken, Change, Committed, ConflictReport, Constraints,
    RetryController, RetryPolicy, UpdateError, UpdateRequest, ValidationError,
};

// Backend
pub use occstore_storage::ShardedStore;
