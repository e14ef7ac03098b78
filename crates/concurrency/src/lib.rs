//! Concurrency layer for occstore
//!
//! This crate turns a versioned [`RecordStore`](occstore_core::RecordStore)
//! into a safe update pipeline:
//! - Change: snapshot (replace, patch) and delta (adjust) mutations
//! - Constraints: domain invariants checked before any write
//! - RetryController: bounded re-read / re-apply loop for delta changes
//! - Cancellation by token or deadline between attempts
//!
//! No lock is held across a caller's think time. Exclusion exists only inside
//! the store's single conditional write.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod controller;
pub mod mutation;
pub mod outcome;
pub mod validation;

pub use cancel::{CancelReason, CancellationToken};
pub use controller::{RetryController, RetryPolicy, UpdateRequest};
pub use mutation::{Adjustment, Change};
pub use outcome::{Committed, ConflictReport, UpdateError, UpdateResult};
pub use validation::{Constraints, ValidationError};
