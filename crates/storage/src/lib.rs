//! Storage layer for occstore
//!
//! This crate implements the in-memory record store:
//! - ShardedStore: DashMap-based storage with per-record compare-and-set
//! - Store-wide version allocation with AtomicU64

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;

pub use sharded::ShardedStore;
