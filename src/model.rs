/// Core data types for the nest monitoring core.
///
/// This module defines the shared domain model imported by all other modules:
/// the nest record and its composite key, the predation vocabulary, the
/// derived success rate, reference points, and the crate error type.
/// It does no I/O.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Date layouts accepted for nest dates, in the order they are tried:
/// ISO, the field form's `dd.MM.yyyy`, and slash-separated day-first.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Datetime layouts produced by spreadsheet exports. Only the date part is kept.
pub const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses a date cell. Returns `None` for empty or unrecognized text.
pub fn parse_nest_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Composite primary key of a nest record. Nest identifiers restart every
/// season, so the id alone is not unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NestKey {
    pub id: i64,
    pub year: i32,
}

impl NestKey {
    pub fn new(id: i64, year: i32) -> Self {
        Self { id, year }
    }
}

impl fmt::Display for NestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID {} ({})", self.id, self.year)
    }
}

// ---------------------------------------------------------------------------
// Predation
// ---------------------------------------------------------------------------

/// Predation outcome of a nest.
///
/// Field sheets and older databases use Turkish labels (`yok`, `yari`,
/// `tam`) and a legacy spelling for partial predation (`kismi`); all of
/// them parse into the three canonical states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredationStatus {
    #[default]
    None,
    Partial,
    Total,
}

impl PredationStatus {
    /// Case-insensitive parse of any known label. Blank text means `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "" | "none" | "yok" => Some(Self::None),
            "partial" | "yari" | "yarı" | "kismi" | "kısmi" => Some(Self::Partial),
            "total" | "tam" => Some(Self::Total),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Partial => "partial",
            Self::Total => "total",
        }
    }

    /// Whether the nest counts towards the predation rate.
    pub fn is_predated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for PredationStatus {
    type Err = NestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| NestError::Validation(format!("unknown predation status '{}'", s)))
    }
}

impl fmt::Display for PredationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predator species observed at a nest.
///
/// Tags are trimmed and lowercased; duplicates are dropped and the first
/// insertion order is kept for display. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredatorSet(IndexSet<String>);

impl PredatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for tag in tags {
            set.insert(tag.as_ref());
        }
        set
    }

    /// Adds a tag. Returns `false` for blank or already present tags.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return false;
        }
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag.trim().to_lowercase().as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array text, the relational store's column format.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Lenient inverse of `to_json`: anything that is not a JSON array of
    /// strings reads as an empty set.
    pub fn from_json(text: &str) -> Self {
        serde_json::from_str::<Vec<String>>(text)
            .map(Self::from_tags)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Nest record
// ---------------------------------------------------------------------------

/// One logged nest observation.
///
/// `year` and `success_rate` are derived fields: the store fills `year`
/// from `nest_date` and recomputes `success_rate` from the egg counts
/// whenever a record is written or copied into a simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestRecord {
    pub id: i64,
    pub year: Option<i32>,

    // Position (WGS84 degrees)
    pub lat: Option<f64>,
    pub lon: Option<f64>,

    // Dates
    pub nest_date: Option<NaiveDate>,
    pub first_hatch_date: Option<NaiveDate>,
    pub second_predation_date: Option<NaiveDate>,

    // Field measurements (meters / centimeters as recorded)
    pub dry_sand_distance: Option<f64>,
    pub damp_sand_distance: Option<f64>,
    pub wet_sand_distance: Option<f64>,
    pub sea_distance: Option<f64>,
    pub depth: Option<f64>,
    pub diameter: Option<f64>,
    pub incubation_days: Option<i32>,
    pub relocated: Option<bool>,
    pub temperature_logger: Option<bool>,
    pub tag: Option<String>,

    // Excavation counts
    pub total_eggs: Option<i32>,
    pub live_hatchlings: Option<i32>,
    pub dead_hatchlings: Option<i32>,
    pub early_embryos: Option<i32>,
    pub mid_embryos: Option<i32>,
    pub late_embryos: Option<i32>,
    pub total_dead_embryos: Option<i32>,
    pub empty_shells: Option<i32>,
    pub predated_eggs: Option<i32>,
    pub unfertilized_eggs: Option<i32>,
    pub hatch_day_1: Option<i32>,
    pub hatch_day_2: Option<i32>,
    pub hatch_day_3: Option<i32>,

    // Derived
    pub success_rate: Option<f64>,

    // Predation
    pub predation_status: PredationStatus,
    pub predator_species: PredatorSet,
}

impl NestRecord {
    /// A record with only its identity filled in.
    pub fn new(id: i64, nest_date: NaiveDate) -> Self {
        Self {
            id,
            year: Some(nest_date.year()),
            nest_date: Some(nest_date),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// The composite key, once `year` is known.
    pub fn key(&self) -> Option<NestKey> {
        self.year.map(|year| NestKey::new(self.id, year))
    }

    /// `(lat, lon)` when both are present and finite.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// Fills `year` from `nest_date`.
    ///
    /// Fails when the nest date is missing or when a year was supplied
    /// that disagrees with it.
    pub fn derive_year(&mut self) -> Result<i32, NestError> {
        let date = self.nest_date.ok_or_else(|| {
            NestError::Validation(format!("nest {} has no nest date", self.id))
        })?;
        let year = date.year();
        match self.year {
            Some(given) if given != year => Err(NestError::Validation(format!(
                "nest {}: year {} does not match nest date {}",
                self.id, given, date
            ))),
            _ => {
                self.year = Some(year);
                Ok(year)
            }
        }
    }

    /// Rejects out-of-range coordinates and negative egg or hatchling
    /// counts. Missing values pass.
    pub fn check_ranges(&self) -> Result<(), NestError> {
        if let Some(lat) = self.lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(NestError::Validation(format!("nest {}: latitude {} out of range", self.id, lat)));
            }
        }
        if let Some(lon) = self.lon {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(NestError::Validation(format!("nest {}: longitude {} out of range", self.id, lon)));
            }
        }
        for (field, value) in [("total eggs", self.total_eggs), ("live hatchlings", self.live_hatchlings)] {
            if let Some(v) = value {
                if v < 0 {
                    return Err(NestError::Validation(format!("nest {}: {} cannot be negative", self.id, field)));
                }
            }
        }
        Ok(())
    }

    pub fn recompute_success_rate(&mut self) {
        self.success_rate = success_rate(self.live_hatchlings, self.total_eggs);
    }
}

/// Hatching success in percent, rounded to two decimals.
///
/// `None` unless the total egg count is positive and live hatchlings
/// have been counted.
pub fn success_rate(live_hatchlings: Option<i32>, total_eggs: Option<i32>) -> Option<f64> {
    match (live_hatchlings, total_eggs) {
        (Some(live), Some(total)) if total > 0 => {
            Some(round2(100.0 * f64::from(live) / f64::from(total)))
        }
        _ => None,
    }
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Reference points
// ---------------------------------------------------------------------------

/// A named coastal landmark used as a distance origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl ReferencePoint {
    pub fn new(name: &str, lat: f64, lon: f64) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            lat,
            lon,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the store, the spatial engine and the simulation engine.
///
/// All failures are per request: the operation that raised one left prior
/// state untouched.
#[derive(Debug)]
pub enum NestError {
    /// A required field is missing or malformed.
    Validation(String),
    /// No record has this key.
    NotFound(NestKey),
    /// A record with this key already exists.
    DuplicateKey(NestKey),
    /// Unknown reference point or unreadable configuration.
    Config(String),
    /// The drawn area is not a usable polygon.
    InvalidGeometry(String),
    /// The relational store rejected a query.
    Database(postgres::Error),
    /// Reading or writing a file failed.
    Io(std::io::Error),
}

impl fmt::Display for NestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestError::Validation(msg) => write!(f, "Validation error: {}", msg),
            NestError::NotFound(key) => write!(f, "Nest not found: {}", key),
            NestError::DuplicateKey(key) => write!(f, "Duplicate nest key: {}", key),
            NestError::Config(msg) => write!(f, "Config error: {}", msg),
            NestError::InvalidGeometry(msg) => write!(f, "Invalid geometry: {}", msg),
            NestError::Database(e) => write!(f, "Database error: {}", e),
            NestError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for NestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NestError::Database(e) => Some(e),
            NestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<postgres::Error> for NestError {
    fn from(e: postgres::Error) -> Self {
        NestError::Database(e)
    }
}

impl From<std::io::Error> for NestError {
    fn from(e: std::io::Error) -> Self {
        NestError::Io(e)
    }
}

impl From<toml::de::Error> for NestError {
    fn from(e: toml::de::Error) -> Self {
        NestError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for NestError {
    fn from(e: toml::ser::Error) -> Self {
        NestError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for NestError {
    fn from(e: serde_json::Error) -> Self {
        NestError::Validation(format!("malformed JSON: {}", e))
    }
}

impl From<csv::Error> for NestError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(io) => NestError::Io(io),
                other => NestError::Validation(format!("malformed CSV: {:?}", other)),
            }
        } else {
            NestError::Validation(format!("malformed CSV: {}", e))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_nest_date_accepts_field_formats() {
        assert_eq!(parse_nest_date("2024-06-12"), Some(date(2024, 6, 12)));
        assert_eq!(parse_nest_date("12.06.2024"), Some(date(2024, 6, 12)));
        assert_eq!(parse_nest_date("12/06/2024"), Some(date(2024, 6, 12)));
        assert_eq!(parse_nest_date(" 2024-06-12 00:00:00 "), Some(date(2024, 6, 12)));
    }

    #[test]
    fn test_parse_nest_date_rejects_garbage() {
        assert_eq!(parse_nest_date(""), None);
        assert_eq!(parse_nest_date("not-a-date"), None);
        assert_eq!(parse_nest_date("2024-13-45"), None);
    }

    #[test]
    fn test_success_rate_rounds_to_two_decimals() {
        assert_eq!(success_rate(Some(2), Some(3)), Some(66.67));
        assert_eq!(success_rate(Some(80), Some(100)), Some(80.0));
        assert_eq!(success_rate(Some(0), Some(95)), Some(0.0));
    }

    #[test]
    fn test_success_rate_is_null_without_positive_total() {
        assert_eq!(success_rate(Some(10), Some(0)), None);
        assert_eq!(success_rate(Some(10), None), None);
        assert_eq!(success_rate(None, Some(90)), None);
    }

    #[test]
    fn test_derive_year_fills_missing_year() {
        let mut record = NestRecord {
            id: 7,
            nest_date: Some(date(2023, 7, 1)),
            ..NestRecord::default()
        };
        assert_eq!(record.derive_year().unwrap(), 2023);
        assert_eq!(record.key(), Some(NestKey::new(7, 2023)));
    }

    #[test]
    fn test_derive_year_rejects_inconsistent_year() {
        let mut record = NestRecord::new(7, date(2023, 7, 1));
        record.year = Some(2024);
        assert!(matches!(record.derive_year(), Err(NestError::Validation(_))));
    }

    #[test]
    fn test_derive_year_requires_nest_date() {
        let mut record = NestRecord {
            id: 7,
            year: Some(2024),
            ..NestRecord::default()
        };
        assert!(matches!(record.derive_year(), Err(NestError::Validation(_))));
    }

    #[test]
    fn test_predation_status_parses_legacy_labels() {
        assert_eq!(PredationStatus::parse("YOK"), Some(PredationStatus::None));
        assert_eq!(PredationStatus::parse(""), Some(PredationStatus::None));
        assert_eq!(PredationStatus::parse("Yari"), Some(PredationStatus::Partial));
        assert_eq!(PredationStatus::parse("kismi"), Some(PredationStatus::Partial));
        assert_eq!(PredationStatus::parse("partial"), Some(PredationStatus::Partial));
        assert_eq!(PredationStatus::parse("TAM"), Some(PredationStatus::Total));
        assert_eq!(PredationStatus::parse("flooded"), None);
        assert!("flooded".parse::<PredationStatus>().is_err());
    }

    #[test]
    fn test_predator_set_is_unique_and_keeps_first_order() {
        let set = PredatorSet::from_tags(["Tilki", "marti", " tilki ", "", "domuz"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["tilki", "marti", "domuz"]);
        assert!(set.contains("TILKI"));
        assert_eq!(set, PredatorSet::from_tags(["domuz", "marti", "tilki"]));
    }

    #[test]
    fn test_predator_set_json_is_lenient() {
        let set = PredatorSet::from_tags(["yengec", "marti"]);
        assert_eq!(PredatorSet::from_json(&set.to_json()), set);
        assert!(PredatorSet::from_json("not json").is_empty());
        assert!(PredatorSet::from_json("").is_empty());
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        let mut record = NestRecord::new(1, date(2024, 6, 1));
        assert_eq!(record.position(), None);
        record.lat = Some(36.27);
        assert_eq!(record.position(), None);
        record.lon = Some(29.29);
        assert_eq!(record.position(), Some((36.27, 29.29)));
    }
}
