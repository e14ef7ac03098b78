//! `Database` facade: catalog flows, config, error mapping.

use std::sync::{Arc, Barrier};
use std::thread;

use occstore::prelude::*;
use occstore::WriterStatus;

fn catalog_db(max_attempts: u32) -> Database {
    Database::builder()
        .catalog()
        .max_attempts(max_attempts)
        .open()
        .unwrap()
}

// =============================================================================
// CATALOG
// =============================================================================

#[test]
fn test_seeded_catalog_views() {
    let db = catalog_db(3);
    let records = db.seed_catalog().unwrap();

    let products: Vec<Product> = records
        .iter()
        .map(|r| Product::try_from(r).unwrap())
        .collect();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Wireless Mouse",
            "Mechanical Keyboard",
            "USB-C Hub",
            "Monitor Stand",
            "Desk Lamp"
        ]
    );
    assert_eq!(products[2].stock, 200);
    assert_eq!(products[3].category, "Accessories");
    assert!(products.iter().all(|p| p.last_modified.is_none()));
}

#[test]
fn test_product_edit_round_trip() {
    let db = catalog_db(3);
    let hub = db.seed_catalog().unwrap().remove(2);

    let mut product = Product::try_from(&hub).unwrap();
    product.price = 44.99;
    product.stock = 180;
    let done = db
        .replace(product.id, product.version, product.to_fields())
        .unwrap();

    let updated = Product::try_from(&done.record).unwrap();
    assert_eq!(updated.price, 44.99);
    assert_eq!(updated.stock, 180);
    assert!(updated.last_modified.is_some());
    assert_ne!(updated.version, product.version);
}

#[test]
fn test_conflict_carries_current_state_for_rerender() {
    let db = catalog_db(3);
    let keyboard = db.seed_catalog().unwrap().remove(1);

    // Editor A and B both loaded the keyboard; A saves first
    db.patch(keyboard.id, keyboard.version, Fields::new().with("price", 84.99))
        .unwrap();
    let err = db
        .patch(keyboard.id, keyboard.version, Fields::new().with("stock", 70))
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    let current = Product::try_from(err.current_record().unwrap()).unwrap();
    assert_eq!(current.price, 84.99);
    assert_eq!(current.stock, 75, "B's change not applied");
}

#[test]
fn test_stock_cannot_go_negative() {
    let db = catalog_db(3);
    let stand = db.seed_catalog().unwrap().remove(3);

    let err = db.adjust(stand.id, catalog::STOCK, -51).unwrap_err();
    assert!(err.is_validation());
    assert!(!err.is_retryable());

    let done = db.adjust(stand.id, catalog::STOCK, -50).unwrap();
    assert_eq!(done.record.fields.get_int(catalog::STOCK), Some(0));
}

#[test]
fn test_required_fields_enforced_on_replace() {
    let db = catalog_db(3);
    let lamp = db.seed_catalog().unwrap().remove(4);

    let err = db
        .replace(lamp.id, lamp.version, Fields::new().with("stock", 5))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(db.get(lamp.id).unwrap().unwrap(), lamp);
}

// =============================================================================
// CONTENTION THROUGH THE FACADE
// =============================================================================

#[test]
fn test_simulation_matches_single_winner() {
    let db = catalog_db(3);
    let mouse = db.seed_catalog().unwrap().remove(0);

    for _ in 0..5 {
        let report = db.simulate_conflict(mouse.id, 8).unwrap();
        assert_eq!(report.successes, 1);
        assert_eq!(report.conflicts, 7);
        assert!(report
            .details
            .iter()
            .all(|d| d.status != WriterStatus::NotFound));
    }
}

#[test]
fn test_stock_drain_never_oversells() {
    const BUYERS: usize = 16;

    // Generous bound so contention never exhausts
    let db = catalog_db(1_000);
    let stand = db.seed_catalog().unwrap().remove(3); // 50 in stock
    let barrier = Arc::new(Barrier::new(BUYERS));

    let handles: Vec<_> = (0..BUYERS)
        .map(|_| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut sold = 0;
                for _ in 0..10 {
                    match db.adjust(stand.id, catalog::STOCK, -1) {
                        Ok(_) => sold += 1,
                        Err(e) if e.is_validation() => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                sold
            })
        })
        .collect();

    let sold: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let remaining = db
        .get(stand.id)
        .unwrap()
        .unwrap()
        .fields
        .get_int(catalog::STOCK)
        .unwrap();

    assert_eq!(sold, 50);
    assert_eq!(remaining, 0);
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_database_from_toml() {
    let config = Config::from_toml_str(
        r#"
        required = ["sku"]

        [retry]
        max_attempts = 4

        [constraints]
        quantity = 0
        "#,
    )
    .unwrap();
    let db = Database::with_config(&config).unwrap();
    assert_eq!(db.max_attempts(), 4);

    let err = db.create(Fields::new().with("quantity", 1)).unwrap_err();
    assert!(err.is_validation());

    let rec = db
        .create(Fields::new().with("sku", "A").with("quantity", 1))
        .unwrap();
    assert!(db.adjust(rec.id, "quantity", -2).unwrap_err().is_validation());
}

#[test]
fn test_delete_via_facade() {
    let db = catalog_db(3);
    let mouse = db.seed_catalog().unwrap().remove(0);
    let moved = db.adjust(mouse.id, catalog::STOCK, -1).unwrap().record;

    assert!(db.delete(mouse.id, mouse.version).unwrap_err().is_conflict());
    assert_eq!(db.delete(mouse.id, moved.version).unwrap(), moved);
    assert_eq!(db.len(), 4);
    assert!(db
        .patch(mouse.id, moved.version, Fields::new().with("stock", 1))
        .unwrap_err()
        .is_not_found());
}

// =============================================================================
// RENDERING
// =============================================================================

#[test]
fn test_reports_render_as_json() {
    let db = catalog_db(3);
    let lamp = db.seed_catalog().unwrap().remove(4);

    let report = db.simulate_conflict(lamp.id, 3).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["successes"], 1);
    assert_eq!(json["conflicts"], 2);
    assert_eq!(json["details"].as_array().unwrap().len(), 3);

    let err = db
        .patch(lamp.id, lamp.version, Fields::new().with("stock", 1))
        .unwrap_err();
    let conflict = serde_json::to_value(err.conflict().unwrap()).unwrap();
    assert_eq!(conflict["current"]["fields"]["name"], "Desk Lamp");
    assert_ne!(conflict["current"]["version"], conflict["expected"]);
}
