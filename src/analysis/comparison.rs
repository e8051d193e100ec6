//! Side-by-side comparison of two statistics summaries.
//!
//! Used for baseline vs. scenario results and for comparing two nesting
//! seasons. Each row carries a trend tag for the second value: up is
//! `Positive`, down is `Negative`, equal or unavailable is `Neutral`.

use super::statistics::NestStatistics;
use crate::logging::{self, Component};
use crate::model::NestRecord;
use crate::report::Severity;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub first: Option<f64>,
    pub second: Option<f64>,
    pub trend: Severity,
}

/// Direction of `second` relative to `first`.
pub fn trend(first: Option<f64>, second: Option<f64>) -> Severity {
    match (first, second) {
        (Some(a), Some(b)) if b > a => Severity::Positive,
        (Some(a), Some(b)) if b < a => Severity::Negative,
        _ => Severity::Neutral,
    }
}

/// One row per metric, in report order.
pub fn compare(first: &NestStatistics, second: &NestStatistics) -> Vec<ComparisonRow> {
    first
        .metrics()
        .into_iter()
        .zip(second.metrics())
        .map(|((label, a), (_, b))| ComparisonRow {
            label: label.to_string(),
            first: a,
            second: b,
            trend: trend(a, b),
        })
        .collect()
}

/// Statistics of two nesting seasons side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearComparison {
    pub first_year: i32,
    pub second_year: i32,
    pub first: NestStatistics,
    pub second: NestStatistics,
    pub rows: Vec<ComparisonRow>,
}

pub fn compare_years(records: &[NestRecord], first_year: i32, second_year: i32) -> YearComparison {
    let season = |year: i32| {
        let subset: Vec<NestRecord> = records
            .iter()
            .filter(|r| r.year == Some(year))
            .cloned()
            .collect();
        NestStatistics::compute(&subset)
    };
    let first = season(first_year);
    let second = season(second_year);

    logging::info(
        Component::Stats,
        None,
        &format!(
            "compared {} ({} nests) with {} ({} nests)",
            first_year, first.total, second_year, second.total
        ),
    );

    YearComparison {
        first_year,
        second_year,
        rows: compare(&first, &second),
        first,
        second,
    }
}
