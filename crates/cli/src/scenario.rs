//! Scenario runners. Each returns pretty-printed JSON.

use std::thread;

use occstore::catalog::{self, Product};
use occstore::{Database, Error, Record};
use serde::Serialize;

use crate::error::{CliError, Result};

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn product(record: &Record) -> Result<Product> {
    Product::try_from(record).map_err(|reason| {
        CliError::Store(Error::Validation {
            id: Some(record.id),
            reason,
        })
    })
}

/// Catalog position, starting at 1.
fn pick(records: &[Record], product: usize) -> Result<&Record> {
    product
        .checked_sub(1)
        .and_then(|i| records.get(i))
        .ok_or(CliError::ProductOutOfRange {
            product,
            count: records.len(),
        })
}

pub fn seed(db: &Database) -> Result<String> {
    let products = db
        .seed_catalog()?
        .iter()
        .map(product)
        .collect::<Result<Vec<_>>>()?;
    to_json(&products)
}

pub fn simulate(db: &Database, product: usize, writers: usize) -> Result<String> {
    let records = db.seed_catalog()?;
    let target = pick(&records, product)?;
    let report = db.simulate_conflict(target.id, writers)?;
    to_json(&report)
}

#[derive(Debug, Default, Serialize)]
struct StormReport {
    product: String,
    initial_stock: i64,
    final_stock: i64,
    committed: usize,
    exhausted: usize,
    rejected: usize,
    failed: usize,
    writes_issued: u64,
    lost_updates: i64,
}

#[derive(Debug, Default)]
struct Tally {
    committed: usize,
    exhausted: usize,
    rejected: usize,
    failed: usize,
    writes: u64,
}

impl Tally {
    fn absorb(&mut self, other: Tally) {
        self.committed += other.committed;
        self.exhausted += other.exhausted;
        self.rejected += other.rejected;
        self.failed += other.failed;
        self.writes += other.writes;
    }
}

pub fn storm(db: &Database, product: usize, writers: usize, rounds: usize, delta: i64) -> Result<String> {
    let records = db.seed_catalog()?;
    let target = pick(&records, product)?;
    let before = self::product(target)?;
    let id = target.id;

    let handles: Vec<_> = (0..writers)
        .map(|_| {
            let db = db.clone();
            thread::spawn(move || {
                let mut tally = Tally::default();
                for _ in 0..rounds {
                    match db.adjust(id, catalog::STOCK, delta) {
                        Ok(done) => {
                            tally.committed += 1;
                            tally.writes += u64::from(done.attempts);
                        }
                        Err(Error::RetryExhausted(report)) => {
                            tally.exhausted += 1;
                            tally.writes += u64::from(report.attempts);
                        }
                        Err(Error::Validation { .. }) => tally.rejected += 1,
                        Err(e) => {
                            tracing::warn!(error = %e, "storm update failed");
                            tally.failed += 1;
                        }
                    }
                }
                tally
            })
        })
        .collect();

    let mut total = Tally::default();
    for handle in handles {
        let tally = handle.join().map_err(|_| CliError::WorkerPanicked)?;
        total.absorb(tally);
    }

    let after = db.get(id)?.ok_or(CliError::Vanished(id))?;
    let after = self::product(&after)?;

    let expected = before.stock + delta * total.committed as i64;
    to_json(&StormReport {
        product: before.name,
        initial_stock: before.stock,
        final_stock: after.stock,
        committed: total.committed,
        exhausted: total.exhausted,
        rejected: total.rejected,
        failed: total.failed,
        writes_issued: total.writes,
        lost_updates: expected - after.stock,
    })
}
