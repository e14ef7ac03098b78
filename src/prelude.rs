//! Convenient imports for occstore.
//!
//! ```
//! use occstore::prelude::*;
//!
//! let db = Database::open()?;
//! let rec = db.create(Fields::new().with("stock", 3))?;
//! db.adjust(rec.id, "stock", 1)?;
//! # Ok::<(), occstore::Error>(())
//! ```

// Main entry point
pub use crate::database::{Database, DatabaseBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Configuration
pub use crate::config::Config;

// Catalog helpers
pub use crate::catalog::{self, Product};

// Core types
pub use crate::types::{Change, Committed, Fields, Record, RecordId, UpdateRequest, Value, Version};

// Cancellation
pub use crate::types::CancellationToken;
