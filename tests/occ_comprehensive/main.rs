//! OCC Comprehensive Test Suite
//!
//! Verifies the optimistic concurrency contract end to end: store-level
//! compare-and-set, the retry controller, and the `Database` facade.
//!
//! ## Key Verification Points
//!
//! 1. Exactly one of N writers racing on one version commits
//! 2. No two committed states share a version
//! 3. Delta updates under contention lose nothing
//! 4. Stale snapshot writes never commit
//! 5. Retries are bounded; validation happens before any write
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test occ_comprehensive
//! cargo test --test occ_comprehensive scenarios::
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use occstore::{
    Change, Constraints, Fields, Record, RecordId, RecordStore, RetryController, RetryPolicy,
    ShardedStore, Version, WriteOutcome,
};
use parking_lot::Mutex;

pub mod facade;
pub mod properties;
pub mod scenarios;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Record used by most scenarios: `{quantity: 150}`
pub fn inventory(quantity: i64) -> Fields {
    Fields::new().with("sku", "MOUSE-01").with("quantity", quantity)
}

/// Constraint set keeping quantity non-negative
pub fn non_negative() -> Constraints {
    Constraints::new().min("quantity", 0)
}

/// Store wrapper that counts calls and, before each of the first
/// `interference` conditional writes, commits a competing delta on
/// `quantity` so the caller's write loses the race.
pub struct InterferingStore {
    inner: ShardedStore,
    rival_delta: i64,
    remaining: Mutex<u32>,
    reads: AtomicU32,
    writes: AtomicU32,
    rival_commits: AtomicU32,
}

impl InterferingStore {
    /// No interference
    pub fn quiet() -> Self {
        Self::new(0, 0)
    }

    /// Interfere `times` times with `rival_delta`
    pub fn new(times: u32, rival_delta: i64) -> Self {
        Self {
            inner: ShardedStore::new(),
            rival_delta,
            remaining: Mutex::new(times),
            reads: AtomicU32::new(0),
            writes: AtomicU32::new(0),
            rival_commits: AtomicU32::new(0),
        }
    }

    /// Conditional writes issued by the caller (rival writes excluded)
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reads issued by the caller
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Competing writes that committed
    pub fn rival_commits(&self) -> u32 {
        self.rival_commits.load(Ordering::SeqCst)
    }

    fn interfere(&self, id: RecordId) -> occstore_core::Result<()> {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return Ok(());
        }
        *remaining -= 1;
        if let Some(current) = self.inner.read(id)? {
            let mut fields = current.fields.clone();
            let quantity = fields.get_int("quantity").unwrap_or(0);
            fields.insert("quantity", quantity + self.rival_delta);
            if self
                .inner
                .conditional_write(id, current.version, fields)?
                .is_committed()
            {
                self.rival_commits.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

impl RecordStore for InterferingStore {
    fn read(&self, id: RecordId) -> occstore_core::Result<Option<Record>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(id)
    }

    fn create(&self, fields: Fields) -> occstore_core::Result<Record> {
        self.inner.create(fields)
    }

    fn conditional_write(
        &self,
        id: RecordId,
        expected: Version,
        fields: Fields,
    ) -> occstore_core::Result<WriteOutcome> {
        self.interfere(id)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.conditional_write(id, expected, fields)
    }

    fn delete(&self, id: RecordId, expected: Version) -> occstore_core::Result<WriteOutcome> {
        self.inner.delete(id, expected)
    }

    fn list(&self) -> occstore_core::Result<Vec<Record>> {
        self.inner.list()
    }
}

/// Controller over an interfering store with the given bound
pub fn controller(
    store: InterferingStore,
    max_attempts: u32,
) -> RetryController<InterferingStore> {
    RetryController::new(store)
        .with_policy(RetryPolicy::new(max_attempts))
        .with_constraints(non_negative())
}

/// Shorthand for a quantity delta
pub fn delta(n: i64) -> Change {
    Change::adjust("quantity", n)
}
