//! Aggregate metrics over a set of nest records.

use crate::model::{round2, NestRecord};
use crate::report::{ReportRow, Severity};
use serde::Serialize;

pub const LABEL_TOTAL: &str = "Total nests";
pub const LABEL_SUCCESS: &str = "Mean success rate (%)";
pub const LABEL_INCUBATION: &str = "Mean incubation (days)";
pub const LABEL_PREDATED: &str = "Predated nests";
pub const LABEL_PREDATION: &str = "Predation rate (%)";

/// Summary of a record set.
///
/// Means skip records where the value is missing and are `None` when no
/// record has one. The predation rate is a population figure and is 0 for
/// an empty set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NestStatistics {
    pub total: usize,
    pub mean_success_rate: Option<f64>,
    pub mean_incubation_days: Option<f64>,
    pub predated: usize,
    pub predation_rate: f64,
}

impl NestStatistics {
    pub fn compute(records: &[NestRecord]) -> Self {
        let total = records.len();
        let predated = records
            .iter()
            .filter(|r| r.predation_status.is_predated())
            .count();
        let predation_rate = if total == 0 {
            0.0
        } else {
            round2(100.0 * predated as f64 / total as f64)
        };

        Self {
            total,
            mean_success_rate: mean(records.iter().filter_map(|r| r.success_rate)),
            mean_incubation_days: mean(
                records
                    .iter()
                    .filter_map(|r| r.incubation_days.map(f64::from)),
            ),
            predated,
            predation_rate,
        }
    }

    /// `(label, value)` pairs in report order.
    pub fn metrics(&self) -> [(&'static str, Option<f64>); 5] {
        [
            (LABEL_TOTAL, Some(self.total as f64)),
            (LABEL_SUCCESS, self.mean_success_rate),
            (LABEL_INCUBATION, self.mean_incubation_days),
            (LABEL_PREDATED, Some(self.predated as f64)),
            (LABEL_PREDATION, Some(self.predation_rate)),
        ]
    }

    /// Rows for the statistics report.
    pub fn report_rows(&self) -> Vec<ReportRow> {
        self.metrics()
            .into_iter()
            .map(|(label, value)| {
                let severity = match label {
                    LABEL_SUCCESS => Severity::Positive,
                    LABEL_PREDATED | LABEL_PREDATION => Severity::Negative,
                    _ => Severity::Neutral,
                };
                ReportRow::new(label, value, severity)
            })
            .collect()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| round2(sum / count as f64))
}
