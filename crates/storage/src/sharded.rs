//! Sharded in-memory record store
//!
//! DashMap keyed by [`RecordId`], FxHash for cheap integer hashing.
//!
//! # Design
//!
//! - DashMap: 16-way sharded by default, readers only contend with writers on
//!   the same shard
//! - Entry API: a conditional write holds the shard write lock across the
//!   version compare and the replacement, which makes it one compare-and-set
//! - Versions: a single store-wide `AtomicU64`, so a token is never reused by
//!   any record, let alone the same one
//!
//! # Thread Safety
//!
//! All operations are thread-safe:
//! - read(): clones the record under the shard read lock
//! - conditional_write()/delete(): lock only the target shard
//! - Different shards never contend

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use occstore_core::conflict;
use occstore_core::error::Result;
use occstore_core::{Fields, Record, RecordId, RecordStore, StoreError, Version, WriteOutcome};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// In-memory [`RecordStore`] with per-record compare-and-set
///
/// # Example
///
/// ```
/// use occstore_core::{Fields, RecordStore, WriteOutcome};
/// use occstore_storage::ShardedStore;
///
/// let store = ShardedStore::new();
/// let rec = store.create(Fields::new().with("stock", 150)).unwrap();
///
/// let outcome = store
///     .conditional_write(rec.id, rec.version, Fields::new().with("stock", 140))
///     .unwrap();
/// assert!(outcome.is_committed());
///
/// // The old version is now stale
/// let stale = store
///     .conditional_write(rec.id, rec.version, Fields::new().with("stock", 0))
///     .unwrap();
/// assert!(matches!(stale, WriteOutcome::VersionMismatch(_)));
/// ```
pub struct ShardedStore {
    /// Committed records
    records: DashMap<RecordId, Record, FxBuildHasher>,
    /// Last allocated version
    version: AtomicU64,
    /// Last allocated record id
    next_id: AtomicU64,
}

impl ShardedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::with_hasher(FxBuildHasher::default()),
            version: AtomicU64::new(0),
            next_id: AtomicU64::new(0),
        }
    }

    /// Create with expected number of records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
            version: AtomicU64::new(0),
            next_id: AtomicU64::new(0),
        }
    }

    /// Last version handed out by this store
    #[inline]
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocate the next version token
    ///
    /// Errors instead of wrapping, since a wrapped counter would reissue
    /// tokens that stale readers may still hold.
    fn next_version(&self) -> Result<Version> {
        self.version
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(1))
            .map(|prev| Version::from_raw(prev + 1))
            .map_err(|_| StoreError::Exhausted("version"))
    }

    fn next_record_id(&self) -> Result<RecordId> {
        self.next_id
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(1))
            .map(|prev| RecordId::new(prev + 1))
            .map_err(|_| StoreError::Exhausted("record id"))
    }
}

impl RecordStore for ShardedStore {
    #[inline]
    fn read(&self, id: RecordId) -> Result<Option<Record>> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    fn create(&self, fields: Fields) -> Result<Record> {
        let id = self.next_record_id()?;
        let version = self.next_version()?;
        let record = Record::new(id, fields, version);
        self.records.insert(id, record.clone());
        tracing::trace!(id = %id, version = %version, "record created");
        Ok(record)
    }

    fn conditional_write(
        &self,
        id: RecordId,
        expected: Version,
        fields: Fields,
    ) -> Result<WriteOutcome> {
        // The entry guard holds the shard write lock until the end of the match
        match self.records.entry(id) {
            Entry::Vacant(_) => Ok(WriteOutcome::NotFound),
            Entry::Occupied(mut entry) => {
                if !conflict::check(expected, entry.get()).is_current() {
                    return Ok(WriteOutcome::VersionMismatch(entry.get().clone()));
                }
                let version = self.next_version()?;
                let next = entry.get().successor(fields, version);
                entry.insert(next.clone());
                tracing::trace!(id = %id, from = %expected, to = %version, "record committed");
                Ok(WriteOutcome::Committed(next))
            }
        }
    }

    fn delete(&self, id: RecordId, expected: Version) -> Result<WriteOutcome> {
        match self.records.entry(id) {
            Entry::Vacant(_) => Ok(WriteOutcome::NotFound),
            Entry::Occupied(entry) => {
                if !conflict::check(expected, entry.get()).is_current() {
                    return Ok(WriteOutcome::VersionMismatch(entry.get().clone()));
                }
                let removed = entry.remove();
                tracing::trace!(id = %id, version = %expected, "record deleted");
                Ok(WriteOutcome::Committed(removed))
            }
        }
    }

    fn list(&self) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("records", &self.len())
            .field("version", &self.current_version())
            .finish()
    }
}
