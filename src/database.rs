//! Main database entry point for occstore.
//!
//! This module provides the [`Database`] struct, an in-memory versioned
//! record store fronted by the optimistic retry controller.

use crate::catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use occstore_concurrency::{Change, Committed, RetryController, UpdateRequest};
use occstore_core::{Fields, Record, RecordId, RecordStore, Version};
use occstore_storage::ShardedStore;
use serde::Serialize;
use std::sync::{Arc, Barrier};
use std::time::Duration;

/// The occstore database.
///
/// Cloning is cheap: clones share the same store, so a clone can be handed to
/// each worker thread.
///
/// # Example
///
/// ```
/// use occstore::prelude::*;
///
/// let db = Database::builder().catalog().open()?;
/// let mouse = db.create(catalog::product_fields("Wireless Mouse", 29.99, 150, "Electronics"))?;
///
/// // Snapshot update: fails if someone else wrote since we read
/// db.patch(mouse.id, mouse.version, Fields::new().with("stock", 140))?;
///
/// // Delta update: retried on conflict, re-applied to fresh state
/// let done = db.adjust(mouse.id, "stock", -5)?;
/// assert_eq!(done.record.fields.get_int("stock"), Some(135));
/// # Ok::<(), occstore::Error>(())
/// ```
#[derive(Clone)]
pub struct Database {
    controller: Arc<RetryController<ShardedStore>>,
}

impl Database {
    /// Open an empty database with default settings.
    ///
    /// Three attempts for delta updates, no backoff, no constraints.
    pub fn open() -> Result<Self> {
        Self::builder().open()
    }

    /// Open an empty database from a parsed configuration.
    pub fn with_config(config: &Config) -> Result<Self> {
        Self::builder().config(config.clone()).open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Insert a new record.
    ///
    /// The fields are checked against the configured constraints first.
    pub fn create(&self, fields: Fields) -> Result<Record> {
        self.controller
            .constraints()
            .validate(&fields)
            .map_err(|reason| Error::Validation { id: None, reason })?;
        Ok(self.store().create(fields)?)
    }

    /// Current committed state of a record.
    pub fn get(&self, id: RecordId) -> Result<Option<Record>> {
        Ok(self.store().read(id)?)
    }

    /// All records, ordered by id.
    pub fn list(&self) -> Result<Vec<Record>> {
        Ok(self.store().list()?)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    /// Whether the database holds no records.
    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    /// Apply `change` computed from the state at version `expected`.
    ///
    /// Snapshot changes fail with [`Error::Conflict`] if the record moved on.
    /// Delta changes are retried up to the configured bound.
    pub fn update(&self, id: RecordId, expected: Version, change: Change) -> Result<Committed> {
        self.execute(&UpdateRequest::new(id, expected, change))
    }

    /// Replace every field of a record.
    pub fn replace(&self, id: RecordId, expected: Version, fields: Fields) -> Result<Committed> {
        self.execute(&UpdateRequest::replace(id, expected, fields))
    }

    /// Overwrite the given fields of a record, keeping the rest.
    pub fn patch(&self, id: RecordId, expected: Version, fields: Fields) -> Result<Committed> {
        self.execute(&UpdateRequest::patch(id, expected, fields))
    }

    /// Add `delta` to an integer field, retrying on conflict.
    pub fn adjust(&self, id: RecordId, field: &str, delta: i64) -> Result<Committed> {
        self.execute(&UpdateRequest::adjust(id, field, delta))
    }

    /// Run a fully specified request (cancellation, deadline).
    pub fn execute(&self, request: &UpdateRequest) -> Result<Committed> {
        self.controller.execute(request).map_err(Error::from)
    }

    /// Delete a record still at version `expected`; returns its final state.
    pub fn delete(&self, id: RecordId, expected: Version) -> Result<Record> {
        self.controller.delete(id, expected).map_err(Error::from)
    }

    /// Insert the sample product catalog.
    pub fn seed_catalog(&self) -> Result<Vec<Record>> {
        let records = catalog::seed_products()
            .into_iter()
            .map(|fields| self.create(fields))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(count = records.len(), "catalog seeded");
        Ok(records)
    }

    /// Race `writers` snapshot updates against one record.
    ///
    /// Every writer reads the same version, waits until all have read, then
    /// sets `price` to the base price plus its writer number. Exactly one
    /// commits; every other writer sees a conflict.
    pub fn simulate_conflict(&self, id: RecordId, writers: usize) -> Result<SimulationReport> {
        let base = self.get(id)?.ok_or(Error::NotFound(id))?;
        let base_price = catalog::Product::try_from(&base)
            .map(|p| p.price)
            .map_err(|reason| Error::Validation {
                id: Some(id),
                reason,
            })?;

        let barrier = Barrier::new(writers.max(1));
        let details = std::thread::scope(|s| {
            let handles: Vec<_> = (1..=writers)
                .map(|writer| {
                    let barrier = &barrier;
                    s.spawn(move || -> Result<WriterResult> {
                        let snapshot = self.get(id);
                        barrier.wait();
                        let Some(snapshot) = snapshot? else {
                            return Ok(WriterResult::new(writer, WriterStatus::NotFound, "record not found"));
                        };
                        let price = base_price + writer as f64;
                        let fields = Fields::new().with(catalog::PRICE, price);
                        match self.patch(id, snapshot.version, fields) {
                            Ok(_) => Ok(WriterResult::new(
                                writer,
                                WriterStatus::Success,
                                format!("price updated to {:.2}", price),
                            )),
                            Err(e) if e.is_conflict() => Ok(WriterResult::new(
                                writer,
                                WriterStatus::Conflict,
                                e.to_string(),
                            )),
                            Err(Error::NotFound(_)) => Ok(WriterResult::new(
                                writer,
                                WriterStatus::NotFound,
                                "record not found",
                            )),
                            Err(e) => Err(e),
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect::<Result<Vec<_>>>()
        })?;

        let report = SimulationReport::from_details(id, details);
        tracing::info!(
            id = %id,
            writers,
            successes = report.successes,
            conflicts = report.conflicts,
            "conflict simulation complete"
        );
        Ok(report)
    }

    /// Active retry bound.
    pub fn max_attempts(&self) -> u32 {
        self.controller.policy().max_attempts
    }

    /// Version counter of the last commit.
    pub fn current_version(&self) -> u64 {
        self.store().current_version()
    }

    fn store(&self) -> &ShardedStore {
        self.controller.store()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("records", &self.len())
            .field("policy", self.controller.policy())
            .finish()
    }
}

/// What one simulated writer observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterStatus {
    /// The write committed
    Success,
    /// Another writer committed first
    Conflict,
    /// The record disappeared
    NotFound,
}

/// Result of one simulated writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriterResult {
    /// Writer number, starting at 1
    pub writer: usize,
    /// Outcome
    pub status: WriterStatus,
    /// Human-readable detail
    pub detail: String,
}

impl WriterResult {
    fn new(writer: usize, status: WriterStatus, detail: impl Into<String>) -> Self {
        Self {
            writer,
            status,
            detail: detail.into(),
        }
    }
}

/// Summary of [`Database::simulate_conflict`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Contended record
    pub id: RecordId,
    /// Writers that committed
    pub successes: usize,
    /// Writers that lost the race
    pub conflicts: usize,
    /// Per-writer results, in writer order
    pub details: Vec<WriterResult>,
}

impl SimulationReport {
    fn from_details(id: RecordId, details: Vec<WriterResult>) -> Self {
        let count = |status| details.iter().filter(|d| d.status == status).count();
        Self {
            id,
            successes: count(WriterStatus::Success),
            conflicts: count(WriterStatus::Conflict),
            details,
        }
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```
/// use occstore::Database;
/// use std::time::Duration;
///
/// let db = Database::builder()
///     .max_attempts(5)
///     .backoff(Duration::from_millis(1))
///     .min("stock", 0)
///     .require("name")
///     .open()?;
/// assert_eq!(db.max_attempts(), 5);
/// # Ok::<(), occstore::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    config: Config,
}

impl DatabaseBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a parsed configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Bound on conditional writes per delta update.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    /// Pause between delta attempts.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.config.retry.backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Keep integer `field` at or above `minimum`.
    pub fn min(mut self, field: impl Into<String>, minimum: i64) -> Self {
        self.config.constraints.insert(field.into(), minimum);
        self
    }

    /// Require `field` on every record.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.config.required.contains(&field) {
            self.config.required.push(field);
        }
        self
    }

    /// Apply the product catalog constraints.
    pub fn catalog(self) -> Self {
        let with_minimums = catalog::MINIMUMS
            .iter()
            .fold(self, |b, &(field, min)| b.min(field, min));
        catalog::REQUIRED
            .iter()
            .fold(with_minimums, |b, &field| b.require(field))
    }

    /// Open the database.
    pub fn open(self) -> Result<Database> {
        self.config.validate()?;
        let controller = RetryController::new(ShardedStore::new())
            .with_policy(self.config.retry_policy())
            .with_constraints(self.config.constraints());
        tracing::debug!(
            max_attempts = self.config.retry.max_attempts,
            backoff_ms = self.config.retry.backoff_ms,
            "database opened"
        );
        Ok(Database {
            controller: Arc::new(controller),
        })
    }
}
