/// Integration tests for the PostgreSQL record store.
///
/// Prerequisites:
/// - PostgreSQL reachable through DATABASE_URL (read from .env)
/// - A role allowed to create the `nests` table
///
/// Run with: cargo test --test pg_store -- --ignored --test-threads=1
///
/// Test records use ids from 990000 upwards and are removed afterwards.

use chrono::NaiveDate;
use nestmon::model::{NestError, NestKey, NestRecord, PredationStatus, PredatorSet};
use nestmon::store::{PgStore, RecordStore};
use std::collections::BTreeSet;

const TEST_ID_BASE: i64 = 990_000;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn get_test_store() -> PgStore {
    let mut store = PgStore::connect_from_env().unwrap_or_else(|e| {
        eprintln!("\n{}\n", "=".repeat(80));
        eprintln!("PG STORE TEST SETUP ERROR: {}", e);
        eprintln!("Set DATABASE_URL in .env to a database you can write to.");
        eprintln!("{}\n", "=".repeat(80));
        panic!("Database connection failed");
    });
    store.ensure_schema().expect("Failed to create nests table");
    cleanup_test_data(&mut store);
    store
}

fn cleanup_test_data(store: &mut PgStore) {
    let keys: BTreeSet<NestKey> = store
        .fetch_all()
        .expect("fetch_all failed")
        .iter()
        .filter(|r| r.id >= TEST_ID_BASE)
        .filter_map(NestRecord::key)
        .collect();
    store.bulk_delete(&keys).expect("cleanup failed");
}

fn test_nest(offset: i64, date: &str) -> NestRecord {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let mut record = NestRecord::new(TEST_ID_BASE + offset, date).with_position(36.27, 29.29);
    record.total_eggs = Some(90);
    record.live_hatchlings = Some(45);
    record.predator_species = PredatorSet::from_tags(["tilki", "marti"]);
    record
}

fn stored(store: &mut PgStore, key: NestKey) -> Option<NestRecord> {
    store
        .fetch_all()
        .unwrap()
        .into_iter()
        .find(|r| r.key() == Some(key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Needs a PostgreSQL database
fn test_insert_roundtrip_and_duplicate_rejection() {
    let mut store = get_test_store();

    let key = store.insert(test_nest(1, "2024-06-10")).unwrap();
    assert!(store.exists(key).unwrap());

    let record = stored(&mut store, key).expect("inserted nest not found");
    assert_eq!(record.success_rate, Some(50.0));
    assert_eq!(record.predator_species.iter().collect::<Vec<_>>(), vec!["tilki", "marti"]);

    let again = store.insert(test_nest(1, "2024-07-01"));
    assert!(matches!(again, Err(NestError::DuplicateKey(k)) if k == key));

    cleanup_test_data(&mut store);
}

#[test]
#[ignore] // Needs a PostgreSQL database
fn test_bulk_insert_skips_existing_keys() {
    let mut store = get_test_store();

    store.insert(test_nest(1, "2024-06-10")).unwrap();
    let inserted = store
        .bulk_insert(vec![
            test_nest(1, "2024-06-11"),
            test_nest(2, "2024-06-12"),
            test_nest(2, "2024-06-13"),
            test_nest(3, "2023-06-12"),
        ])
        .unwrap();
    assert_eq!(inserted, 2, "existing and repeated keys should be skipped");

    cleanup_test_data(&mut store);
}

#[test]
#[ignore] // Needs a PostgreSQL database
fn test_update_predation_and_bulk_delete() {
    let mut store = get_test_store();

    let key = store.insert(test_nest(5, "2024-06-10")).unwrap();
    store
        .update_predation(key, PredationStatus::Partial, PredatorSet::from_tags(["yengec"]))
        .unwrap();
    let record = stored(&mut store, key).unwrap();
    assert_eq!(record.predation_status, PredationStatus::Partial);
    assert!(record.predator_species.contains("yengec"));

    let missing = NestKey::new(TEST_ID_BASE + 99, 2024);
    assert!(matches!(
        store.update_predation(missing, PredationStatus::Total, PredatorSet::new()),
        Err(NestError::NotFound(_))
    ));

    let keys: BTreeSet<NestKey> = [key, missing].into_iter().collect();
    assert_eq!(store.bulk_delete(&keys).unwrap(), 1);
    assert!(!store.exists(key).unwrap());
}
