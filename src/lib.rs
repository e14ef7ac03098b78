//! # occstore
//!
//! Optimistic concurrency control for versioned records.
//!
//! Every record carries an opaque [`Version`]. A write succeeds only if the
//! version it was computed from is still current; otherwise the caller gets
//! the current state back instead of silently overwriting someone else's
//! change.
//!
//! ## Quick Start
//!
//! ```
//! use occstore::prelude::*;
//!
//! let db = Database::builder().catalog().open()?;
//! let products = db.seed_catalog()?;
//! let mouse = &products[0];
//!
//! // Two editors read the same version...
//! let first = db.patch(mouse.id, mouse.version, Fields::new().with("stock", 140))?;
//! // ...the second one is told it is stale
//! let err = db.patch(mouse.id, mouse.version, Fields::new().with("stock", 0)).unwrap_err();
//! assert!(err.is_conflict());
//! assert_eq!(err.current_record(), Some(&first.record));
//! # Ok::<(), occstore::Error>(())
//! ```
//!
//! ## Change Kinds
//!
//! | Change | On conflict |
//! |--------|-------------|
//! | `Replace` / `Patch` | reported to the caller with the current state |
//! | `Adjust` (delta) | re-applied to fresh state, up to `max_attempts` |
//!
//! Constraints are checked before any write and a violation is never retried.

#![warn(missing_docs)]

pub mod catalog;
mod config;
mod database;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use config::{Config, RetryConfig};
pub use database::{Database, DatabaseBuilder, SimulationReport, WriterResult, WriterStatus};
pub use error::{Error, Result};

// Re-export types
pub use types::*;
