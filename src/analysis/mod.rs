/// Statistics and record selection over nest record sets.
///
/// Everything here is a pure function of the records passed in; callers
/// fetch from the store, optionally apply a spatial filter, and hand the
/// resulting slice over.
///
/// Submodules:
/// - `statistics` — aggregate metrics and their report rows.
/// - `comparison` — two summaries side by side with trend tags.
/// - `selection` — id list/range picking, search, listing order.

pub mod comparison;
pub mod selection;
pub mod statistics;

pub use comparison::{compare, compare_years, ComparisonRow, YearComparison};
pub use selection::{search, sort_for_listing, IdSelection, SearchField};
pub use statistics::NestStatistics;
