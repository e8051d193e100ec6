/// Record store for nest observations.
///
/// The core talks to storage only through `RecordStore`: key lookups,
/// full scans, single inserts, batch inserts and batch deletes keyed by
/// `(id, year)`. Two backends are provided:
/// - `memory` — an in-process `BTreeMap`, used by tests and one-off analyses.
/// - `postgres` — the relational table used by the desktop application.
///
/// Every backend runs records through `prepare_record` before writing, so
/// the derived `year` and `success_rate` fields are consistent no matter
/// which path wrote them.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::model::{NestError, NestKey, NestRecord, PredationStatus, PredatorSet};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Store interface
// ---------------------------------------------------------------------------

pub trait RecordStore {
    /// Whether a record with this key is stored.
    fn exists(&mut self, key: NestKey) -> Result<bool, NestError>;

    /// Manual entry. Requires id, position and nest date; derives `year`
    /// and `success_rate`. A colliding key is rejected with
    /// `DuplicateKey` and the store is left unchanged.
    fn insert(&mut self, record: NestRecord) -> Result<NestKey, NestError>;

    /// Batch entry. Rows without a derivable key, and rows whose key is
    /// already stored (or repeated earlier in the batch), are skipped.
    /// Returns the number of records written.
    fn bulk_insert(&mut self, records: Vec<NestRecord>) -> Result<usize, NestError>;

    /// Overwrites the predation outcome of one record.
    fn update_predation(
        &mut self,
        key: NestKey,
        status: PredationStatus,
        species: PredatorSet,
    ) -> Result<(), NestError>;

    /// Deletes every listed key in one transaction; on error nothing is
    /// deleted. Keys that are not stored are ignored. Returns the number
    /// of records removed.
    fn bulk_delete(&mut self, keys: &BTreeSet<NestKey>) -> Result<usize, NestError>;

    /// Every stored record. Callers sort as needed.
    fn fetch_all(&mut self) -> Result<Vec<NestRecord>, NestError>;
}

// ---------------------------------------------------------------------------
// Shared validation
// ---------------------------------------------------------------------------

/// Derives the key and the success rate, and checks value ranges.
///
/// Position is optional here; `prepare_manual` additionally requires it.
pub fn prepare_record(mut record: NestRecord) -> Result<(NestKey, NestRecord), NestError> {
    let year = record.derive_year()?;
    let key = NestKey::new(record.id, year);

    record.check_ranges()?;
    record.recompute_success_rate();
    Ok((key, record))
}

/// `prepare_record` plus the manual-entry requirement of a position.
pub fn prepare_manual(record: NestRecord) -> Result<(NestKey, NestRecord), NestError> {
    if record.lat.is_none() || record.lon.is_none() {
        return Err(NestError::Validation(format!(
            "nest {}: latitude and longitude are required",
            record.id
        )));
    }
    prepare_record(record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> NestRecord {
        let mut r = NestRecord::new(3, NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());
        r.year = None;
        r
    }

    #[test]
    fn test_prepare_record_derives_key_and_success_rate() {
        let mut r = record();
        r.total_eggs = Some(80);
        r.live_hatchlings = Some(60);
        r.success_rate = Some(1.0); // stale value is overwritten
        let (key, prepared) = prepare_record(r).unwrap();
        assert_eq!(key, NestKey::new(3, 2024));
        assert_eq!(prepared.year, Some(2024));
        assert_eq!(prepared.success_rate, Some(75.0));
    }

    #[test]
    fn test_prepare_record_rejects_out_of_range_position() {
        let r = record().with_position(91.0, 29.0);
        assert!(matches!(prepare_record(r), Err(NestError::Validation(_))));
        let r = record().with_position(36.0, 181.0);
        assert!(matches!(prepare_record(r), Err(NestError::Validation(_))));
    }

    #[test]
    fn test_prepare_record_rejects_negative_counts() {
        let mut r = record();
        r.total_eggs = Some(-1);
        assert!(matches!(prepare_record(r), Err(NestError::Validation(_))));
    }

    #[test]
    fn test_prepare_manual_requires_position() {
        assert!(matches!(prepare_manual(record()), Err(NestError::Validation(_))));
        assert!(prepare_manual(record().with_position(36.27, 29.29)).is_ok());
    }
}
