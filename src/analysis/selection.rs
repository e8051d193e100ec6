//! Record selection for listings and charts.
//!
//! Covers the explicit id list / id range picker, free-text search by
//! criterion, and the listing sort order.

use crate::model::{NestError, NestRecord, PredationStatus};
use std::cmp::Reverse;
use std::collections::BTreeSet;

// ============================================================================
// Id selection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdSelection {
    #[default]
    All,
    /// Explicit ids.
    List(BTreeSet<i64>),
    /// Inclusive bounds; a missing bound is open.
    Range { min: Option<i64>, max: Option<i64> },
}

impl IdSelection {
    /// Parses a comma-separated id list such as `"3, 7,12"`.
    ///
    /// Tokens that are not plain digits (including negative numbers) are
    /// ignored. A blank list selects everything; a
    /// list with no valid id at all is a `Validation` error.
    pub fn parse_list(text: &str) -> Result<Self, NestError> {
        if text.trim().is_empty() {
            return Ok(IdSelection::All);
        }
        let ids: BTreeSet<i64> = text
            .split(',')
            .filter_map(parse_id)
            .collect();
        if ids.is_empty() {
            return Err(NestError::Validation(format!("no valid nest id in '{}'", text.trim())));
        }
        Ok(IdSelection::List(ids))
    }

    /// Builds a range from the two bound boxes. A bound that is blank or
    /// not plain digits is treated as open.
    pub fn range(min: &str, max: &str) -> Self {
        let min = parse_id(min);
        let max = parse_id(max);
        match (min, max) {
            (None, None) => IdSelection::All,
            (min, max) => IdSelection::Range { min, max },
        }
    }

    pub fn matches(&self, id: i64) -> bool {
        match self {
            IdSelection::All => true,
            IdSelection::List(ids) => ids.contains(&id),
            IdSelection::Range { min, max } => {
                min.is_none_or(|lo| id >= lo) && max.is_none_or(|hi| id <= hi)
            }
        }
    }

    pub fn apply(&self, records: &[NestRecord]) -> Vec<NestRecord> {
        records
            .iter()
            .filter(|r| self.matches(r.id))
            .cloned()
            .collect()
    }
}

/// Nest ids are typed as digits only; signs and blanks are rejected.
fn parse_id(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    Id,
    Year,
    Status,
    Predator,
    #[default]
    Any,
}

impl SearchField {
    /// Accepts the English names and the labels of the original search box.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "id" => Some(SearchField::Id),
            "year" | "yil" | "yıl" => Some(SearchField::Year),
            "status" | "durum" => Some(SearchField::Status),
            "predator" | "predatör" => Some(SearchField::Predator),
            "any" | "all" | "hepsi" | "tümü" => Some(SearchField::Any),
            _ => None,
        }
    }
}

fn status_matches(status: PredationStatus, query: &str) -> bool {
    match PredationStatus::parse(query) {
        Some(parsed) => parsed == status,
        None => status.as_str().contains(query),
    }
}

fn field_matches(record: &NestRecord, field: SearchField, query: &str) -> bool {
    let id = || record.id.to_string().contains(query);
    let year = || record.year.is_some_and(|y| y.to_string().contains(query));
    let status = || status_matches(record.predation_status, query);
    let predator = || record.predator_species.iter().any(|tag| tag.contains(query));

    match field {
        SearchField::Id => id(),
        SearchField::Year => year(),
        SearchField::Status => status(),
        SearchField::Predator => predator(),
        SearchField::Any => {
            id() || year()
                || status()
                || predator()
                || record
                    .tag
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(query))
                || record
                    .nest_date
                    .is_some_and(|d| d.to_string().contains(query))
        }
    }
}

/// Case-insensitive substring search. A blank query matches everything.
pub fn search(records: &[NestRecord], field: SearchField, query: &str) -> Vec<NestRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| field_matches(r, field, &query))
        .cloned()
        .collect()
}

// ============================================================================
// Listing order
// ============================================================================

/// Newest ids first; for a shared id, the most recent season first.
pub fn sort_for_listing(records: &mut [NestRecord]) {
    records.sort_by_key(|r| (Reverse(r.id), Reverse(r.year)));
}
