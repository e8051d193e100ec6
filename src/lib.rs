/// Sea-turtle nest monitoring core.
///
/// Keeps nest records keyed by `(id, year)`, filters them by distance to
/// coastal landmarks or by a drawn area in projected meters, summarizes
/// them, and runs what-if predation scenarios on private copies.
///
/// Modules:
/// - `model` — records, keys, predation vocabulary, errors.
/// - `landmarks` / `config` — reference points and the TOML configuration.
/// - `logging` — component-tagged logging on `tracing`.
/// - `store` — the record store trait with memory and PostgreSQL backends.
/// - `ingest` — bulk import from spreadsheet/CSV exports.
/// - `spatial` — projection, drawn areas, radius and area filters.
/// - `analysis` — statistics, comparisons, selection and search.
/// - `report` — renderer-neutral report rows and record highlights.
/// - `simulation` — scenario engine.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod landmarks;
pub mod logging;
pub mod model;
pub mod report;
pub mod simulation;
pub mod spatial;
pub mod store;
