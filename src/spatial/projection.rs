//! # Coordinate Projection
//!
//! Projects geographic coordinates (WGS84 lat/lon) into a UTM zone so that
//! buffers and containment are evaluated in meters.
//!
//! ## Pipeline
//! ```text
//! Geographic (WGS84)  →  Projected (UTM, EPSG:326zz / 327zz)
//!   lat/lon degrees       easting/northing meters
//! ```
//!
//! With the `proj-transforms` feature, points go through PROJ and the
//! series is only a fallback.
//!
//! The forward transverse Mercator series below (Snyder, *Map Projections
//! — A Working Manual*, eq. 8-9 to 8-11) is accurate to well under a
//! millimeter within a zone, far tighter than GPS fixes on the beach.

use geo::Point;

// ============================================================================
// Ellipsoid and UTM constants
// ============================================================================

/// WGS84 semi-major axis, meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor on the central meridian.
const UTM_K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

// ============================================================================
// UtmProjection
// ============================================================================

/// A single UTM zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmProjection {
    zone: u8,
    northern: bool,
}

impl Default for UtmProjection {
    /// Zone 35N (EPSG:32635), which contains the Patara coast.
    fn default() -> Self {
        Self::new(35, true)
    }
}

impl UtmProjection {
    /// Zone numbers outside 1–60 are clamped into range.
    pub fn new(zone: u8, northern: bool) -> Self {
        Self {
            zone: zone.clamp(1, 60),
            northern,
        }
    }

    /// The zone whose 6° band contains `lon`.
    pub fn for_longitude(lon: f64, northern: bool) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i64).rem_euclid(60) + 1;
        Self::new(zone as u8, northern)
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    pub fn is_northern(&self) -> bool {
        self.northern
    }

    /// EPSG code of the zone, e.g. 32635.
    pub fn epsg_code(&self) -> u32 {
        let base = if self.northern { 32600 } else { 32700 };
        base + u32::from(self.zone)
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    /// Projects `(lat, lon)` degrees to a point with `x` = easting and
    /// `y` = northing, in meters.
    ///
    /// With the `proj-transforms` feature the PROJ library is tried first;
    /// the built-in series is used when it is disabled or fails.
    pub fn project(&self, lat: f64, lon: f64) -> Point<f64> {
        #[cfg(feature = "proj-transforms")]
        {
            if let Some((easting, northing)) = self.proj_transform(lat, lon) {
                return Point::new(easting, northing);
            }
        }

        self.project_native(lat, lon)
    }

    /// PROJ transform from EPSG:4326 to this zone's EPSG code.
    #[cfg(feature = "proj-transforms")]
    fn proj_transform(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        use proj::Proj;

        let target = format!("EPSG:{}", self.epsg_code());
        let transformer = Proj::new_known_crs("EPSG:4326", &target, None).ok()?;
        // lon/lat order for EPSG:4326
        transformer.convert((lon, lat)).ok()
    }

    /// Forward transverse Mercator series, independent of PROJ.
    pub fn project_native(&self, lat: f64, lon: f64) -> Point<f64> {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon - self.central_meridian()).to_radians();
        let m = meridian_arc(phi, e2);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = UTM_K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let mut northing = UTM_K0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
        if !self.northern {
            northing += FALSE_NORTHING_SOUTH;
        }

        Point::new(easting, northing)
    }
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Planar distance between two projected points, meters.
pub fn planar_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_on_central_meridian_is_false_origin() {
        let p = UtmProjection::default().project_native(0.0, 27.0);
        assert!((p.x() - 500_000.0).abs() < 1e-6, "easting was {}", p.x());
        assert!(p.y().abs() < 1e-6, "northing was {}", p.y());
    }

    #[test]
    fn test_central_meridian_has_false_easting() {
        let p = UtmProjection::default().project_native(36.27, 27.0);
        assert!((p.x() - 500_000.0).abs() < 1e-6);
        // One degree of latitude is ~111 km, so 36.27° lands near 4,015 km.
        assert!((4_000_000.0..4_030_000.0).contains(&p.y()), "northing was {}", p.y());
    }

    #[test]
    fn test_projection_is_symmetric_about_central_meridian() {
        let proj = UtmProjection::default();
        let east = proj.project_native(36.27, 29.29);
        let west = proj.project_native(36.27, 24.71);
        assert!((east.x() - 500_000.0 + (west.x() - 500_000.0)).abs() < 1e-6);
        assert!((east.y() - west.y()).abs() < 1e-6);
    }

    #[test]
    fn test_short_meridional_step_is_meter_accurate() {
        // 0.001° of latitude at 36°N is ~110.96 m on the ellipsoid; the
        // UTM scale factor 2.3° off the central meridian is ~1.0001.
        let proj = UtmProjection::default();
        let a = proj.project(36.270, 29.29);
        let b = proj.project(36.271, 29.29);
        let d = planar_distance(a, b);
        assert!((110.5..111.5).contains(&d), "distance was {}", d);
    }

    #[test]
    fn test_east_west_step_shrinks_with_latitude() {
        // Raw degree differences overstate east-west distances away from
        // the equator by 1/cos(lat); the projection must not.
        let proj = UtmProjection::default();
        let d = planar_distance(proj.project(36.27, 29.290), proj.project(36.27, 29.291));
        let expected = 111_320.0 * 0.001 * 36.27_f64.to_radians().cos();
        assert!((d - expected).abs() < 1.0, "distance was {}, expected ~{}", d, expected);
    }

    #[test]
    fn test_southern_hemisphere_adds_false_northing() {
        let north = UtmProjection::new(35, true).project_native(-10.0, 27.0);
        let south = UtmProjection::new(35, false).project_native(-10.0, 27.0);
        assert!((south.y() - north.y() - 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zone_lookup_and_epsg() {
        let proj = UtmProjection::for_longitude(29.29, true);
        assert_eq!(proj.zone(), 35);
        assert_eq!(proj.epsg_code(), 32635);
        assert_eq!(proj.central_meridian(), 27.0);
        assert_eq!(UtmProjection::for_longitude(-180.0, false).zone(), 1);
        assert_eq!(UtmProjection::for_longitude(179.9, false).epsg_code(), 32760);
    }

    #[cfg(feature = "proj-transforms")]
    #[test]
    fn test_proj_and_native_series_agree() {
        let proj = UtmProjection::default();
        for (lat, lon) in [(36.2578, 29.3078), (36.30, 29.25), (35.9, 27.0)] {
            let a = proj.project(lat, lon);
            let b = proj.project_native(lat, lon);
            assert!(planar_distance(a, b) < 0.01, "({}, {}) differs by {} m", lat, lon, planar_distance(a, b));
        }
    }
}
