//! Retry controller
//!
//! Orchestrates read → apply → validate → conditional write cycles against a
//! [`RecordStore`].
//!
//! ## Attempt Sequence
//!
//! ```text
//! 1. poll cancellation          -> Cancelled
//! 2. read(id)                   -> NotFound if absent
//! 3. snapshot change, stale?    -> VersionConflict (no write issued)
//! 4. apply change + validate    -> ValidationFailed (no write issued)
//! 5. poll cancellation          -> Cancelled (no partial write)
//! 6. conditional_write(id, base.version, candidate)
//!    Committed       -> Success
//!    NotFound        -> NotFound (deleted mid-flight)
//!    VersionMismatch -> snapshot change: VersionConflict
//!                       delta change: RetryExhausted if attempts == max,
//!                       else back off (-> Cancelled if triggered) and
//!                       return to 4 with the returned current record
//! ```
//!
//! No lock is held between attempts; each conditional write is an independent
//! store operation, so a retrying caller never starves other writers.

use crate::cancel::{self, CancellationToken};
use crate::mutation::{Adjustment, Change};
use crate::outcome::{Committed, ConflictReport, UpdateError, UpdateResult};
use crate::validation::Constraints;
use occstore_core::{Fields, Record, RecordId, RecordStore, Version, WriteOutcome};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Bound on automatic retries of delta changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum conditional writes per request, first attempt included
    pub max_attempts: u32,
    /// Pause between a lost race and the next attempt
    #[serde(default, with = "duration_millis")]
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Default bound on attempts
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Policy with the given bound and no backoff
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    /// Set the pause between attempts
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Effective bound (a zero bound still allows the first attempt)
    fn bound(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// One update request
///
/// Snapshot changes (replace, patch) always carry the version the caller read.
/// Delta changes carry none: the controller reads fresh state itself.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    id: RecordId,
    expected: Option<Version>,
    change: Change,
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl UpdateRequest {
    /// Request `change` against the state identified by `expected`
    ///
    /// For delta changes `expected` is informational only; a stale value is
    /// not a conflict because the delta is re-applied to fresh state.
    pub fn new(id: RecordId, expected: Version, change: Change) -> Self {
        Self {
            id,
            expected: Some(expected),
            change,
            cancel: None,
            deadline: None,
        }
    }

    /// Full replacement computed from version `expected`
    pub fn replace(id: RecordId, expected: Version, fields: Fields) -> Self {
        Self::new(id, expected, Change::Replace(fields))
    }

    /// Partial overwrite computed from version `expected`
    pub fn patch(id: RecordId, expected: Version, fields: Fields) -> Self {
        Self::new(id, expected, Change::Patch(fields))
    }

    /// Add `delta` to integer `field`, retried automatically on conflict
    pub fn adjust(id: RecordId, field: impl Into<String>, delta: i64) -> Self {
        Self {
            id,
            expected: None,
            change: Change::Adjust(Adjustment::new(field, delta)),
            cancel: None,
            deadline: None,
        }
    }

    /// Abandon the request when `token` is triggered
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Abandon the request at `deadline`
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abandon the request after `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Target record
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Requested change
    pub fn change(&self) -> &Change {
        &self.change
    }

    /// Version the caller presented, if any
    pub fn expected(&self) -> Option<Version> {
        self.expected
    }
}

/// Runs update requests against a store
///
/// # Example
///
/// ```
/// use occstore_concurrency::{RetryController, UpdateRequest};
/// use occstore_core::{Fields, RecordStore};
/// use occstore_storage::ShardedStore;
///
/// let controller = RetryController::new(ShardedStore::new());
/// let rec = controller.store().create(Fields::new().with("stock", 150)).unwrap();
///
/// let done = controller.execute(&UpdateRequest::adjust(rec.id, "stock", -10)).unwrap();
/// assert_eq!(done.record.fields.get_int("stock"), Some(140));
/// assert_eq!(done.attempts, 1);
/// ```
#[derive(Debug)]
pub struct RetryController<S> {
    store: S,
    policy: RetryPolicy,
    constraints: Constraints,
}

impl<S: RecordStore> RetryController<S> {
    /// Controller with the default policy and no constraints
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            constraints: Constraints::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the domain constraints
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Active constraints
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Run one update request to a terminal outcome
    pub fn execute(&self, req: &UpdateRequest) -> UpdateResult {
        let id = req.id;
        let retryable = req.change.is_retryable();
        let bound = self.policy.bound();
        let mut attempts: u32 = 0;

        self.poll_cancel(req, attempts)?;
        let mut base = self
            .store
            .read(id)?
            .ok_or(UpdateError::NotFound { id })?;

        loop {
            let expected = match req.expected {
                Some(expected) if !retryable => {
                    if !occstore_core::conflict::check(expected, &base).is_current() {
                        tracing::debug!(
                            id = %id,
                            expected = %expected,
                            current = %base.version,
                            "stale snapshot rejected before write"
                        );
                        return Err(UpdateError::VersionConflict(ConflictReport {
                            id,
                            expected,
                            current: base,
                            attempts: 1,
                        }));
                    }
                    expected
                }
                _ => base.version,
            };

            let candidate = req
                .change
                .apply(&base)
                .and_then(|fields| self.constraints.validate(&fields).map(|()| fields))
                .map_err(|reason| UpdateError::ValidationFailed { id, reason })?;

            self.poll_cancel(req, attempts)?;
            attempts += 1;
            tracing::debug!(
                id = %id,
                attempt = attempts,
                version = %expected,
                mode = req.change.mode(),
                "conditional write"
            );

            match self.store.conditional_write(id, expected, candidate)? {
                WriteOutcome::Committed(record) => {
                    return Ok(Committed { record, attempts });
                }
                WriteOutcome::NotFound => return Err(UpdateError::NotFound { id }),
                WriteOutcome::VersionMismatch(current) => {
                    let report = ConflictReport {
                        id,
                        expected,
                        current,
                        attempts,
                    };
                    if !retryable {
                        return Err(UpdateError::VersionConflict(report));
                    }
                    if attempts >= bound {
                        tracing::warn!(
                            id = %id,
                            attempts,
                            current = %report.current.version,
                            "retry bound exhausted"
                        );
                        return Err(UpdateError::RetryExhausted(report));
                    }
                    tracing::debug!(
                        id = %id,
                        attempt = attempts,
                        current = %report.current.version,
                        "lost race, retrying from current state"
                    );
                    self.pause(req, attempts)?;
                    base = report.current;
                }
            }
        }
    }

    /// Apply `change` computed from version `expected`
    pub fn update(&self, id: RecordId, expected: Version, change: Change) -> UpdateResult {
        self.execute(&UpdateRequest::new(id, expected, change))
    }

    /// Add `delta` to integer `field`, retrying on conflict
    pub fn adjust(&self, id: RecordId, field: impl Into<String>, delta: i64) -> UpdateResult {
        self.execute(&UpdateRequest::adjust(id, field, delta))
    }

    /// Delete a record if it is still at version `expected`
    ///
    /// Never retried: a delete is always a snapshot decision.
    pub fn delete(&self, id: RecordId, expected: Version) -> Result<Record, UpdateError> {
        match self.store.delete(id, expected)? {
            WriteOutcome::Committed(removed) => {
                tracing::debug!(id = %id, version = %expected, "record deleted");
                Ok(removed)
            }
            WriteOutcome::VersionMismatch(current) => {
                Err(UpdateError::VersionConflict(ConflictReport {
                    id,
                    expected,
                    current,
                    attempts: 1,
                }))
            }
            WriteOutcome::NotFound => Err(UpdateError::NotFound { id }),
        }
    }

    fn poll_cancel(&self, req: &UpdateRequest, attempts: u32) -> Result<(), UpdateError> {
        match cancel::poll(req.cancel.as_ref(), req.deadline) {
            None => Ok(()),
            Some(reason) => {
                tracing::debug!(id = %req.id, attempts, %reason, "update abandoned");
                Err(UpdateError::Cancelled {
                    id: req.id,
                    attempts,
                    reason,
                })
            }
        }
    }

    /// Back off before the next attempt
    ///
    /// The wait never runs past the request deadline and ends as soon as the
    /// token is triggered.
    fn pause(&self, req: &UpdateRequest, attempts: u32) -> Result<(), UpdateError> {
        let wait = self.policy.backoff;
        if wait.is_zero() {
            return Ok(());
        }
        match cancel::sleep(wait, req.cancel.as_ref(), req.deadline) {
            None => Ok(()),
            Some(_) => self.poll_cancel(req, attempts),
        }
    }
}
