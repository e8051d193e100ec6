/// Bulk import of nest records from external tabular sources.
///
/// Submodules:
/// - `tabular` — header normalization, per-row parsing, `import_rows`.
/// - `csv_source` — CSV exports read into tabular rows.

pub mod csv_source;
pub mod tabular;

pub use tabular::{import_rows, normalize_column, ImportSummary, TabularRow};
