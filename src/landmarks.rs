/// Reference point registry for the nesting beach.
///
/// Defines the built-in coastal landmarks used as distance origins by the
/// radius filter and the location-threat scenario, ordered from the
/// southern end of the beach to the northern end. Deployments may replace
/// them through the configuration file (see `config`); everything else
/// looks landmarks up through `ReferencePoints` rather than hardcoding
/// coordinates.

use crate::model::{NestError, ReferencePoint};
use indexmap::IndexMap;

// ---------------------------------------------------------------------------
// Built-in landmarks
// ---------------------------------------------------------------------------

/// A built-in landmark: lowercased name and WGS84 position.
pub struct Landmark {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// The twelve landmarks written to a fresh configuration file.
pub static DEFAULT_LANDMARKS: &[Landmark] = &[
    Landmark { name: "dağ", latitude: 36.2486, longitude: 29.3157 },
    Landmark { name: "işletme", latitude: 36.2524, longitude: 29.3127 },
    Landmark { name: "info", latitude: 36.2534, longitude: 29.3121 },
    Landmark { name: "çalılıklar", latitude: 36.2546, longitude: 29.3109 },
    Landmark { name: "fener", latitude: 36.2578, longitude: 29.3078 },
    Landmark { name: "kum tepesi", latitude: 36.2654, longitude: 29.2997 },
    Landmark { name: "bayrak", latitude: 36.2750, longitude: 29.2887 },
    Landmark { name: "kamp alanı", latitude: 36.2762, longitude: 29.2858 },
    Landmark { name: "çay sonu", latitude: 36.2791, longitude: 29.2806 },
    Landmark { name: "çay ortası", latitude: 36.2819, longitude: 29.2764 },
    Landmark { name: "çay başı", latitude: 36.2906, longitude: 29.2651 },
    Landmark { name: "bitiş", latitude: 36.2933, longitude: 29.2631 },
];

/// Name used by selection widgets for "no reference point".
pub const NO_REFERENCE: &str = "yok";

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Loaded reference points keyed by lowercased name, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferencePoints {
    points: IndexMap<String, ReferencePoint>,
}

impl ReferencePoints {
    /// The built-in registry.
    pub fn builtin() -> Self {
        Self::from_pairs(
            DEFAULT_LANDMARKS
                .iter()
                .map(|l| (l.name.to_string(), [l.latitude, l.longitude])),
        )
    }

    /// Builds a registry from `(name, [lat, lon])` pairs, the configuration
    /// file's shape. Names are trimmed and lowercased; a later duplicate
    /// replaces an earlier one in place.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, [f64; 2])>,
    {
        let mut points = IndexMap::new();
        for (name, [lat, lon]) in pairs {
            let point = ReferencePoint::new(&name, lat, lon);
            points.insert(point.name.clone(), point);
        }
        Self { points }
    }

    /// Looks up a landmark by name, case-insensitively.
    pub fn find(&self, name: &str) -> Option<&ReferencePoint> {
        self.points.get(name.trim().to_lowercase().as_str())
    }

    /// Like `find`, but an unknown name is a configuration error.
    pub fn require(&self, name: &str) -> Result<&ReferencePoint, NestError> {
        self.find(name)
            .ok_or_else(|| NestError::Config(format!("unknown reference point '{}'", name)))
    }

    /// Landmark names in configuration order, for selection widgets.
    pub fn names(&self) -> Vec<&str> {
        self.points.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferencePoint> {
        self.points.values()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(name, [lat, lon])` pairs for writing back to the configuration file.
    pub fn to_pairs(&self) -> IndexMap<String, [f64; 2]> {
        self.points
            .values()
            .map(|p| (p.name.clone(), [p.lat, p.lon]))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_twelve_landmarks() {
        assert_eq!(DEFAULT_LANDMARKS.len(), 12);
        assert_eq!(ReferencePoints::builtin().len(), 12);
    }

    #[test]
    fn test_no_duplicate_landmark_names() {
        let mut seen = std::collections::HashSet::new();
        for landmark in DEFAULT_LANDMARKS {
            assert!(
                seen.insert(landmark.name),
                "duplicate landmark '{}' in DEFAULT_LANDMARKS",
                landmark.name
            );
        }
    }

    #[test]
    fn test_builtin_names_are_already_lowercase() {
        for landmark in DEFAULT_LANDMARKS {
            assert_eq!(landmark.name, landmark.name.to_lowercase());
        }
    }

    #[test]
    fn test_landmarks_lie_on_the_patara_strip() {
        // The coastal strip is a few kilometers long; anything outside this
        // box is a typo in the coordinates.
        for landmark in DEFAULT_LANDMARKS {
            assert!(
                (36.20..36.35).contains(&landmark.latitude),
                "latitude of '{}' is off the beach",
                landmark.name
            );
            assert!(
                (29.20..29.35).contains(&landmark.longitude),
                "longitude of '{}' is off the beach",
                landmark.name
            );
        }
    }

    #[test]
    fn test_landmarks_run_south_to_north() {
        for pair in DEFAULT_LANDMARKS.windows(2) {
            assert!(
                pair[0].latitude < pair[1].latitude,
                "'{}' should be south of '{}'",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let points = ReferencePoints::builtin();
        let fener = points.find("  Fener ").expect("fener should be registered");
        assert_eq!(fener.name, "fener");
        assert_eq!(fener.lat, 36.2578);
    }

    #[test]
    fn test_require_unknown_name_is_config_error() {
        let points = ReferencePoints::builtin();
        assert!(matches!(points.require("atlantis"), Err(NestError::Config(_))));
        assert!(points.find(NO_REFERENCE).is_none());
    }

    #[test]
    fn test_from_pairs_lowercases_and_keeps_order() {
        let points = ReferencePoints::from_pairs(vec![
            ("Beta".to_string(), [1.0, 2.0]),
            ("alpha".to_string(), [3.0, 4.0]),
            ("BETA".to_string(), [5.0, 6.0]),
        ]);
        assert_eq!(points.names(), vec!["beta", "alpha"]);
        assert_eq!(points.find("beta").unwrap().lat, 5.0);
    }
}
