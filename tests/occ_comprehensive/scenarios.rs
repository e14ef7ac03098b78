//! Concrete inventory scenarios.
//!
//! Each test walks one end-to-end story against a record starting at
//! `{quantity: 150}` (or `{quantity: 10}` where noted).

use crate::*;
use occstore::UpdateError;

// =============================================================================
// DELTA UPDATES
// =============================================================================

#[test]
fn test_uncontended_delta_commits_first_try() {
    let ctl = controller(InterferingStore::quiet(), 3);
    let v1 = ctl.store().create(inventory(150)).unwrap();

    let done = ctl.update(v1.id, v1.version, delta(-10)).unwrap();

    assert_eq!(done.record.fields.get_int("quantity"), Some(140));
    assert_ne!(done.record.version, v1.version);
    assert_eq!(done.attempts, 1);
    assert_eq!(ctl.store().writes(), 1);
}

#[test]
fn test_losing_delta_retries_from_fresh_state() {
    // Competing caller commits its -5 first: {145, v2}
    let ctl = controller(InterferingStore::new(1, -5), 3);
    let v1 = ctl.store().create(inventory(150)).unwrap();

    let done = ctl.update(v1.id, v1.version, delta(-5)).unwrap();

    assert_eq!(ctl.store().rival_commits(), 1);
    assert_eq!(done.record.fields.get_int("quantity"), Some(140));
    assert_eq!(done.attempts, 2);

    let v3 = ctl.store().read(v1.id).unwrap().unwrap();
    assert_eq!(v3, done.record);
}

// =============================================================================
// SNAPSHOT UPDATES
// =============================================================================

#[test]
fn test_stale_replacement_conflicts_without_retry() {
    let ctl = controller(InterferingStore::quiet(), 3);
    let v1 = ctl.store().create(inventory(150)).unwrap();
    let v2 = ctl.update(v1.id, v1.version, delta(-5)).unwrap().record;
    let writes = ctl.store().writes();

    let err = ctl
        .update(v1.id, v1.version, Change::Replace(inventory(999)))
        .unwrap_err();

    let report = match err {
        UpdateError::VersionConflict(report) => report,
        other => panic!("expected VersionConflict, got {:?}", other),
    };
    assert_eq!(report.attempts, 1);
    assert_eq!(report.expected, v1.version);
    assert_eq!(report.current, v2);
    assert_eq!(report.current.fields.get_int("quantity"), Some(145));
    assert_eq!(ctl.store().writes(), writes, "no write issued");
}

// =============================================================================
// VALIDATION
// =============================================================================

#[test]
fn test_invalid_delta_never_reaches_store() {
    let ctl = controller(InterferingStore::quiet(), 3);
    let rec = ctl.store().create(inventory(10)).unwrap();

    let err = ctl.update(rec.id, rec.version, delta(-20)).unwrap_err();

    assert!(matches!(err, UpdateError::ValidationFailed { .. }));
    assert_eq!(ctl.store().writes(), 0);
    let unchanged = ctl.store().read(rec.id).unwrap().unwrap();
    assert_eq!(unchanged, rec);
}

// =============================================================================
// RETRY BOUND
// =============================================================================

#[test]
fn test_always_losing_delta_exhausts_after_bound() {
    // Three rivals firing in lockstep: the controller loses every race
    let ctl = controller(InterferingStore::new(3, -1), 2);
    let rec = ctl.store().create(inventory(150)).unwrap();

    let err = ctl.update(rec.id, rec.version, delta(-5)).unwrap_err();

    let report = match err {
        UpdateError::RetryExhausted(report) => report,
        other => panic!("expected RetryExhausted, got {:?}", other),
    };
    assert_eq!(report.attempts, 2);
    assert_eq!(ctl.store().writes(), 2);
    assert_eq!(report.current.fields.get_int("quantity"), Some(148));
}

// =============================================================================
// DELETE
// =============================================================================

#[test]
fn test_delete_then_everything_is_not_found() {
    let ctl = controller(InterferingStore::quiet(), 3);
    let rec = ctl.store().create(inventory(150)).unwrap();

    let removed = ctl.delete(rec.id, rec.version).unwrap();
    assert_eq!(removed, rec);

    assert_eq!(ctl.store().read(rec.id).unwrap(), None);
    let outcome = ctl
        .store()
        .conditional_write(rec.id, rec.version, inventory(1))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::NotFound);
    assert!(ctl
        .update(rec.id, rec.version, delta(1))
        .unwrap_err()
        .is_not_found());
}
