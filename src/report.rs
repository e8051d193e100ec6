//! Report output boundary.
//!
//! The core hands results to renderers (PDF writer, table view) as
//! ordered `(label, value, severity)` rows and never formats text or
//! colors itself. A renderer maps `Severity` to its own palette.

use crate::model::{NestRecord, PredationStatus};
use serde::Serialize;
use std::fmt;

/// Success rate at or above which a nest is highlighted as successful.
pub const HIGH_SUCCESS_THRESHOLD: f64 = 75.0;

/// Success rate at or below which a nest is highlighted as failing.
pub const LOW_SUCCESS_THRESHOLD: f64 = 25.0;

// ============================================================================
// Severity
// ============================================================================

/// How a value should be read: neutral information, a good outcome, or a
/// bad one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Neutral,
    Positive,
    Negative,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Neutral => write!(f, "neutral"),
            Severity::Positive => write!(f, "positive"),
            Severity::Negative => write!(f, "negative"),
        }
    }
}

/// One labelled value. `None` renders as "N/A".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub value: Option<f64>,
    pub severity: Severity,
}

impl ReportRow {
    pub fn new(label: &str, value: Option<f64>, severity: Severity) -> Self {
        Self {
            label: label.to_string(),
            value,
            severity,
        }
    }
}

// ============================================================================
// Record highlight
// ============================================================================

/// Row highlight for a nest in the listing view.
///
/// Predation takes precedence over the success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordHighlight {
    TotalPredation,
    PartialPredation,
    HighSuccess,
    LowSuccess,
    Normal,
}

impl RecordHighlight {
    pub fn classify(record: &NestRecord) -> Self {
        match record.predation_status {
            PredationStatus::Total => return RecordHighlight::TotalPredation,
            PredationStatus::Partial => return RecordHighlight::PartialPredation,
            PredationStatus::None => {}
        }
        match record.success_rate {
            Some(rate) if rate >= HIGH_SUCCESS_THRESHOLD => RecordHighlight::HighSuccess,
            Some(rate) if rate <= LOW_SUCCESS_THRESHOLD => RecordHighlight::LowSuccess,
            _ => RecordHighlight::Normal,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RecordHighlight::TotalPredation | RecordHighlight::LowSuccess => Severity::Negative,
            RecordHighlight::HighSuccess => Severity::Positive,
            RecordHighlight::PartialPredation | RecordHighlight::Normal => Severity::Neutral,
        }
    }
}
