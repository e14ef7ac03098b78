//! Core types for occstore
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`Version`]: opaque version token
//! - [`Record`] / [`Fields`] / [`Value`]: the versioned data model
//! - [`RecordStore`] / [`WriteOutcome`]: the version-gated storage contract
//! - [`conflict::check`]: the version comparison rule
//! - [`StoreError`]: backend failures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conflict;
pub mod error;
pub mod record;
pub mod traits;
pub mod types;
pub mod value;

pub use conflict::ConflictCheck;
pub use error::{Result, StoreError};
pub use record::Record;
pub use traits::{RecordStore, WriteOutcome};
pub use types::{ParseVersionError, RecordId, Timestamp, Version};
pub use value::{Fields, Value};
