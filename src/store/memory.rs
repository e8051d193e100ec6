/// In-process record store.
///
/// Records live in a `BTreeMap` keyed by `(id, year)`. Each trait method
/// takes `&mut self`, so the borrow checker serializes writers; batch
/// operations validate before touching the map, which makes them atomic.

use super::{prepare_manual, prepare_record, RecordStore};
use crate::logging::{self, Component};
use crate::model::{NestError, NestKey, NestRecord, PredationStatus, PredatorSet};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<NestKey, NestRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: NestKey) -> Option<&NestRecord> {
        self.records.get(&key)
    }
}

impl RecordStore for MemoryStore {
    fn exists(&mut self, key: NestKey) -> Result<bool, NestError> {
        Ok(self.records.contains_key(&key))
    }

    fn insert(&mut self, record: NestRecord) -> Result<NestKey, NestError> {
        let (key, record) = prepare_manual(record).inspect_err(|e| {
            logging::log_failure(Component::Store, None, "insert", e);
        })?;
        if self.records.contains_key(&key) {
            let err = NestError::DuplicateKey(key);
            logging::log_failure(Component::Store, Some(key), "insert", &err);
            return Err(err);
        }
        self.records.insert(key, record);
        logging::info(Component::Store, Some(key), "nest added");
        Ok(key)
    }

    fn bulk_insert(&mut self, records: Vec<NestRecord>) -> Result<usize, NestError> {
        let total = records.len();
        let mut inserted = 0;
        for record in records {
            match prepare_record(record) {
                Ok((key, record)) => {
                    if self.records.contains_key(&key) {
                        logging::debug(Component::Store, Some(key), "already stored; skipped");
                        continue;
                    }
                    self.records.insert(key, record);
                    inserted += 1;
                }
                Err(e) => logging::log_failure(Component::Store, None, "bulk insert row", &e),
            }
        }
        logging::log_batch_summary(Component::Store, total, inserted, total - inserted);
        Ok(inserted)
    }

    fn update_predation(
        &mut self,
        key: NestKey,
        status: PredationStatus,
        species: PredatorSet,
    ) -> Result<(), NestError> {
        let record = self.records.get_mut(&key).ok_or(NestError::NotFound(key))?;
        record.predation_status = status;
        record.predator_species = species;
        logging::info(
            Component::Store,
            Some(key),
            &format!("predation status set to {}", status),
        );
        Ok(())
    }

    fn bulk_delete(&mut self, keys: &BTreeSet<NestKey>) -> Result<usize, NestError> {
        let removed = keys
            .iter()
            .filter(|key| self.records.remove(key).is_some())
            .count();
        logging::warn(
            Component::Store,
            None,
            &format!("{} nests deleted ({} requested)", removed, keys.len()),
        );
        Ok(removed)
    }

    fn fetch_all(&mut self) -> Result<Vec<NestRecord>, NestError> {
        Ok(self.records.values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn nest(id: i64, y: i32, m: u32, d: u32) -> NestRecord {
        NestRecord::new(id, NaiveDate::from_ymd_opt(y, m, d).unwrap()).with_position(36.27, 29.29)
    }

    #[test]
    fn test_insert_then_exists() {
        let mut store = MemoryStore::new();
        let key = store.insert(nest(1, 2024, 6, 1)).unwrap();
        assert_eq!(key, NestKey::new(1, 2024));
        assert!(store.exists(key).unwrap());
        assert!(!store.exists(NestKey::new(1, 2023)).unwrap());
    }

    #[test]
    fn test_duplicate_insert_is_rejected_and_store_unchanged() {
        let mut store = MemoryStore::new();
        let mut first = nest(1, 2024, 6, 1);
        first.total_eggs = Some(100);
        store.insert(first).unwrap();
        let before = store.fetch_all().unwrap();

        let mut second = nest(1, 2024, 7, 15);
        second.total_eggs = Some(5);
        let result = store.insert(second);
        assert!(matches!(result, Err(NestError::DuplicateKey(k)) if k == NestKey::new(1, 2024)));
        assert_eq!(store.fetch_all().unwrap(), before);
    }

    #[test]
    fn test_same_id_in_different_years_is_allowed() {
        let mut store = MemoryStore::new();
        store.insert(nest(1, 2023, 6, 1)).unwrap();
        store.insert(nest(1, 2024, 6, 1)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_insert_without_position_is_validation_error() {
        let mut store = MemoryStore::new();
        let r = NestRecord::new(1, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(matches!(store.insert(r), Err(NestError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_bulk_insert_skips_existing_and_repeated_keys() {
        let mut store = MemoryStore::new();
        store.insert(nest(1, 2024, 6, 1)).unwrap();
        let batch = vec![
            nest(1, 2024, 6, 2), // already stored
            nest(2, 2024, 6, 3),
            nest(2, 2024, 6, 4), // repeated in batch
            NestRecord { id: 3, ..NestRecord::default() }, // no date
            nest(4, 2024, 6, 5),
        ];
        assert_eq!(store.bulk_insert(batch).unwrap(), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.get(NestKey::new(2, 2024)).unwrap().nest_date,
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
    }

    #[test]
    fn test_bulk_insert_allows_missing_position() {
        let mut store = MemoryStore::new();
        let r = NestRecord::new(9, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(store.bulk_insert(vec![r]).unwrap(), 1);
    }

    #[test]
    fn test_update_predation() {
        let mut store = MemoryStore::new();
        let key = store.insert(nest(1, 2024, 6, 1)).unwrap();
        store
            .update_predation(key, PredationStatus::Total, PredatorSet::from_tags(["tilki"]))
            .unwrap();
        let record = store.get(key).unwrap();
        assert_eq!(record.predation_status, PredationStatus::Total);
        assert!(record.predator_species.contains("tilki"));
    }

    #[test]
    fn test_update_predation_missing_key_is_not_found() {
        let mut store = MemoryStore::new();
        let result = store.update_predation(NestKey::new(5, 2024), PredationStatus::Partial, PredatorSet::new());
        assert!(matches!(result, Err(NestError::NotFound(_))));
    }

    #[test]
    fn test_bulk_delete_removes_listed_keys() {
        let mut store = MemoryStore::new();
        for id in 1..=4 {
            store.insert(nest(id, 2024, 6, 1)).unwrap();
        }
        let keys: BTreeSet<NestKey> = [NestKey::new(1, 2024), NestKey::new(3, 2024), NestKey::new(9, 2024)]
            .into_iter()
            .collect();
        assert_eq!(store.bulk_delete(&keys).unwrap(), 2);
        let remaining: Vec<i64> = store.fetch_all().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![2, 4]);
    }
}
