//! Property tests: delta commutativity and version uniqueness.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;

use crate::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Concurrent deltas land on the same total as applying them serially
    #[test]
    fn prop_concurrent_deltas_sum(
        start in -1_000i64..1_000,
        deltas in prop::collection::vec(-50i64..50, 1..24),
    ) {
        let ctl = Arc::new(
            RetryController::new(ShardedStore::new())
                .with_policy(RetryPolicy::new(u32::MAX)),
        );
        let rec = ctl.store().create(inventory(start)).unwrap();
        let barrier = Arc::new(Barrier::new(deltas.len()));

        let handles: Vec<_> = deltas
            .iter()
            .map(|&d| {
                let ctl = Arc::clone(&ctl);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ctl.adjust(rec.id, "quantity", d).unwrap()
                })
            })
            .collect();

        let committed: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let expected: i64 = start + deltas.iter().sum::<i64>();
        let last = ctl.store().read(rec.id).unwrap().unwrap();

        prop_assert_eq!(last.fields.get_int("quantity"), Some(expected));

        let versions: HashSet<Version> = committed.iter().map(|c| c.record.version).collect();
        prop_assert_eq!(versions.len(), deltas.len());
    }

    /// Serial deltas through the controller match a plain fold
    #[test]
    fn prop_serial_deltas_fold(
        start in 0i64..10_000,
        deltas in prop::collection::vec(-100i64..100, 0..32),
    ) {
        let ctl = RetryController::new(ShardedStore::new());
        let rec = ctl.store().create(inventory(start)).unwrap();

        let mut seen = HashSet::new();
        seen.insert(rec.version);
        for &d in &deltas {
            let done = ctl.adjust(rec.id, "quantity", d).unwrap();
            prop_assert!(seen.insert(done.record.version), "version reused");
            prop_assert_eq!(done.attempts, 1);
        }

        let last = ctl.store().read(rec.id).unwrap().unwrap();
        prop_assert_eq!(
            last.fields.get_int("quantity"),
            Some(start + deltas.iter().sum::<i64>())
        );
    }

    /// A stale snapshot never commits, whatever the fields
    #[test]
    fn prop_stale_snapshot_rejected(quantity in any::<i64>(), bumps in 1usize..5) {
        let ctl = RetryController::new(ShardedStore::new());
        let v1 = ctl.store().create(inventory(0)).unwrap();
        for _ in 0..bumps {
            ctl.adjust(v1.id, "quantity", 1).unwrap();
        }
        let before = ctl.store().read(v1.id).unwrap().unwrap();

        let result = ctl.update(v1.id, v1.version, Change::Replace(inventory(quantity)));

        prop_assert!(result.unwrap_err().is_conflict());
        prop_assert_eq!(ctl.store().read(v1.id).unwrap().unwrap(), before);
    }
}
