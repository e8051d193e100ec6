/// Geospatial filter engine.
///
/// Submodules:
/// - `projection` — WGS84 → UTM forward projection.
/// - `drawing` — free-hand areas from the map's drawing surface.
/// - `filter` — radius and drawn-area predicates over nest records.

pub mod drawing;
pub mod filter;
pub mod projection;

pub use drawing::DrawnArea;
pub use filter::{parse_radius, FilterRequest, SpatialFilter};
pub use projection::UtmProjection;
