//! Free-hand areas drawn on the map.
//!
//! The drawing surface reports shapes the way geometry interchange formats
//! do: longitude first. Everything past this module works in
//! `(lat, lon)` order.

use super::projection::UtmProjection;
use crate::model::NestError;
use geo::{LineString, Polygon};
use geojson::{GeoJson, Value};
use std::collections::HashSet;

/// A closed ring of `(lat, lon)` vertices.
///
/// Self-intersecting rings are kept as drawn; the only requirement is at
/// least three distinct vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnArea {
    vertices: Vec<(f64, f64)>,
}

impl DrawnArea {
    /// Builds an area from `(lon, lat)` pairs as sent by the drawing surface.
    pub fn from_lon_lat(coords: &[(f64, f64)]) -> Result<Self, NestError> {
        Self::from_lat_lon(coords.iter().map(|&(lon, lat)| (lat, lon)).collect())
    }

    /// Builds an area from `(lat, lon)` pairs.
    pub fn from_lat_lon(vertices: Vec<(f64, f64)>) -> Result<Self, NestError> {
        if let Some(&(lat, lon)) = vertices.iter().find(|(lat, lon)| !lat.is_finite() || !lon.is_finite()) {
            return Err(NestError::InvalidGeometry(format!(
                "vertex ({}, {}) is not a finite coordinate",
                lat, lon
            )));
        }
        let distinct: HashSet<(u64, u64)> = vertices
            .iter()
            .map(|(lat, lon)| (lat.to_bits(), lon.to_bits()))
            .collect();
        if distinct.len() < 3 {
            return Err(NestError::InvalidGeometry(format!(
                "a polygon needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }
        Ok(Self { vertices })
    }

    /// Parses a GeoJSON `Feature`, bare geometry, or `FeatureCollection`
    /// (the most recently drawn feature wins).
    ///
    /// `Polygon` uses its exterior ring; a `LineString` is closed into a
    /// ring. Any other geometry type is rejected.
    pub fn from_geojson(text: &str) -> Result<Self, NestError> {
        let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| {
            NestError::InvalidGeometry(format!("drawing is not valid GeoJSON: {}", e))
        })?;

        let geometry = match geojson {
            GeoJson::Geometry(g) => Some(g),
            GeoJson::Feature(f) => f.geometry,
            GeoJson::FeatureCollection(fc) => fc.features.into_iter().rev().find_map(|f| f.geometry),
        }
        .ok_or_else(|| NestError::InvalidGeometry("drawing has no geometry".to_string()))?;

        let ring = match geometry.value {
            Value::Polygon(rings) => rings
                .into_iter()
                .next()
                .ok_or_else(|| NestError::InvalidGeometry("polygon has no exterior ring".to_string()))?,
            Value::LineString(coords) => coords,
            _ => {
                return Err(NestError::InvalidGeometry(
                    "unsupported drawing type; expected Polygon or LineString".to_string(),
                ));
            }
        };

        let mut lon_lat = Vec::with_capacity(ring.len());
        for position in &ring {
            if position.len() < 2 {
                return Err(NestError::InvalidGeometry(format!(
                    "malformed position {:?}",
                    position
                )));
            }
            lon_lat.push((position[0], position[1]));
        }
        Self::from_lon_lat(&lon_lat)
    }

    /// Vertices in `(lat, lon)` order, as supplied.
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// The ring in projected meters. `Polygon::new` closes it if needed.
    pub fn to_projected(&self, projection: &UtmProjection) -> Polygon<f64> {
        let ring: Vec<(f64, f64)> = self
            .vertices
            .iter()
            .map(|&(lat, lon)| {
                let p = projection.project(lat, lon);
                (p.x(), p.y())
            })
            .collect();
        Polygon::new(LineString::from(ring), vec![])
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lon_lat_input_is_swapped() {
        let area = DrawnArea::from_lon_lat(&[(29.0, 36.0), (29.1, 36.0), (29.1, 36.1)]).unwrap();
        assert_eq!(area.vertices()[0], (36.0, 29.0));
        assert_eq!(area.vertices()[2], (36.1, 29.1));
    }

    #[test]
    fn test_fewer_than_three_distinct_vertices_is_invalid() {
        let result = DrawnArea::from_lon_lat(&[(29.0, 36.0), (29.1, 36.0), (29.0, 36.0), (29.1, 36.0)]);
        assert!(matches!(result, Err(NestError::InvalidGeometry(_))));
        assert!(DrawnArea::from_lon_lat(&[]).is_err());
    }

    #[test]
    fn test_self_intersecting_ring_is_accepted() {
        // Bow-tie: edges cross in the middle.
        let bow_tie = [(29.0, 36.0), (29.1, 36.1), (29.1, 36.0), (29.0, 36.1)];
        assert!(DrawnArea::from_lon_lat(&bow_tie).is_ok());
    }

    #[test]
    fn test_non_finite_vertex_is_invalid() {
        let result = DrawnArea::from_lat_lon(vec![(36.0, 29.0), (f64::NAN, 29.1), (36.1, 29.1)]);
        assert!(matches!(result, Err(NestError::InvalidGeometry(_))));
    }

    #[test]
    fn test_geojson_polygon_feature() {
        let text = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[29.28, 36.26], [29.30, 36.26], [29.30, 36.28], [29.28, 36.28], [29.28, 36.26]]]
            }
        }"#;
        let area = DrawnArea::from_geojson(text).unwrap();
        assert_eq!(area.vertices().len(), 5);
        assert_eq!(area.vertices()[1], (36.26, 29.30));
    }

    #[test]
    fn test_geojson_linestring_geometry() {
        let text = r#"{"type": "LineString", "coordinates": [[29.28, 36.26], [29.30, 36.26], [29.30, 36.28]]}"#;
        let area = DrawnArea::from_geojson(text).unwrap();
        assert_eq!(area.vertices().len(), 3);
    }

    #[test]
    fn test_geojson_collection_uses_last_drawn_feature() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[29.0, 36.0], [29.1, 36.0], [29.1, 36.1]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates": [[[29.28, 36.26], [29.30, 36.26], [29.30, 36.28], [29.28, 36.26]]]}}
            ]
        }"#;
        let area = DrawnArea::from_geojson(text).unwrap();
        assert_eq!(area.vertices()[0], (36.26, 29.28));
    }

    #[test]
    fn test_geojson_feature_without_geometry_is_invalid() {
        let text = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        assert!(matches!(DrawnArea::from_geojson(text), Err(NestError::InvalidGeometry(_))));
    }

    #[test]
    fn test_geojson_point_is_unsupported() {
        let text = r#"{"type": "Point", "coordinates": [29.28, 36.26]}"#;
        assert!(matches!(DrawnArea::from_geojson(text), Err(NestError::InvalidGeometry(_))));
    }

    #[test]
    fn test_geojson_garbage_is_invalid_geometry() {
        assert!(matches!(DrawnArea::from_geojson("{{"), Err(NestError::InvalidGeometry(_))));
        let text = r#"{"type": "Polygon", "coordinates": [[[29.28], [29.30, 36.26]]]}"#;
        assert!(matches!(DrawnArea::from_geojson(text), Err(NestError::InvalidGeometry(_))));
    }
}
