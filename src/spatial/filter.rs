//! Radius and drawn-area predicates over nest records.
//!
//! Both predicates project the records and the reference geometry into the
//! configured UTM zone before testing membership, so a 300 m buffer is
//! 300 m on the ground in every direction. Records without a position
//! never match a spatial predicate.

use super::drawing::DrawnArea;
use super::projection::{planar_distance, UtmProjection};
use crate::landmarks::{ReferencePoints, NO_REFERENCE};
use crate::logging::{self, Component};
use crate::model::{NestError, NestRecord, ReferencePoint};
use geo::Contains;

// ============================================================================
// SpatialFilter
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialFilter {
    projection: UtmProjection,
}

impl SpatialFilter {
    pub fn new(projection: UtmProjection) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &UtmProjection {
        &self.projection
    }

    /// Indices of the records strictly inside a circular buffer of
    /// `radius_m` meters around `origin`.
    ///
    /// A point exactly on the buffer boundary is outside. A negative or
    /// non-finite radius matches nothing.
    pub fn indices_within_radius(
        &self,
        records: &[NestRecord],
        origin: &ReferencePoint,
        radius_m: f64,
    ) -> Vec<usize> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Vec::new();
        }
        let center = self.projection.project(origin.lat, origin.lon);
        records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| {
                let (lat, lon) = record.position()?;
                let point = self.projection.project(lat, lon);
                (planar_distance(center, point) < radius_m).then_some(i)
            })
            .collect()
    }

    pub fn within_radius(
        &self,
        records: &[NestRecord],
        origin: &ReferencePoint,
        radius_m: f64,
    ) -> Vec<NestRecord> {
        let hits = self.indices_within_radius(records, origin, radius_m);
        logging::info(
            Component::Geo,
            None,
            &format!(
                "{} nests within {} m of '{}'",
                hits.len(),
                radius_m,
                origin.name
            ),
        );
        select(records, &hits)
    }

    /// Indices of the records strictly inside the drawn area.
    pub fn indices_within_area(&self, records: &[NestRecord], area: &DrawnArea) -> Vec<usize> {
        let polygon = area.to_projected(&self.projection);
        records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| {
                let (lat, lon) = record.position()?;
                polygon.contains(&self.projection.project(lat, lon)).then_some(i)
            })
            .collect()
    }

    pub fn within_area(&self, records: &[NestRecord], area: &DrawnArea) -> Vec<NestRecord> {
        let hits = self.indices_within_area(records, area);
        logging::info(
            Component::Geo,
            None,
            &format!("{} nests inside the drawn area", hits.len()),
        );
        select(records, &hits)
    }

    /// Applies a map-view filter request.
    ///
    /// A drawn area takes precedence over the reference point. A missing
    /// reference, the `yok` placeholder, or a radius that is not a whole
    /// number leaves the records unfiltered. An unknown reference name is
    /// a `Config` error unless there are no records to filter.
    pub fn apply(
        &self,
        records: Vec<NestRecord>,
        request: &FilterRequest,
        landmarks: &ReferencePoints,
    ) -> Result<Vec<NestRecord>, NestError> {
        if let Some(area) = &request.area {
            return Ok(self.within_area(&records, area));
        }

        let reference = match request.reference.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case(NO_REFERENCE) => name,
            _ => return Ok(records),
        };
        let Some(radius_m) = request.radius.as_deref().and_then(parse_radius) else {
            logging::debug(
                Component::Geo,
                None,
                "radius is not a whole number of meters; showing all nests",
            );
            return Ok(records);
        };
        if records.is_empty() {
            return Ok(records);
        }

        let origin = landmarks.require(reference)?;
        Ok(self.within_radius(&records, origin, f64::from(radius_m)))
    }
}

fn select(records: &[NestRecord], indices: &[usize]) -> Vec<NestRecord> {
    indices.iter().map(|&i| records[i].clone()).collect()
}

// ============================================================================
// FilterRequest
// ============================================================================

/// Spatial filter inputs as they arrive from the map view: raw text for the
/// reference selector and radius box, plus an optional drawn area.
#[derive(Debug, Clone, Default)]
pub struct FilterRequest {
    pub area: Option<DrawnArea>,
    pub reference: Option<String>,
    pub radius: Option<String>,
}

impl FilterRequest {
    pub fn radius(reference: &str, radius: &str) -> Self {
        Self {
            area: None,
            reference: Some(reference.to_string()),
            radius: Some(radius.to_string()),
        }
    }

    pub fn area(area: DrawnArea) -> Self {
        Self {
            area: Some(area),
            ..Self::default()
        }
    }
}

/// Parses a radius box: whole meters only, surrounding blanks allowed.
pub fn parse_radius(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// ============================================================================
// Tests
// ============================================================================
