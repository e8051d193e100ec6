/// What-if scenarios over a copy of the nest records.
///
/// A scenario rewrites predation status on a private copy of the records,
/// recomputes every derived field on that copy, and summarizes the
/// untouched baseline and the hypothetical set side by side. The store is
/// only ever read. Each run is independent: the same scenario over the
/// same records always produces the same outcome.
///
/// Two scenario kinds are supported:
/// - `LocationThreat` — every nest within a radius of a landmark gets the
///   target status (e.g. a new beach facility next to the lighthouse).
/// - `StatusTransition` — every nest at one status moves to another
///   (e.g. "what if all partially predated nests had been protected").

use crate::analysis::comparison::{compare, ComparisonRow};
use crate::analysis::statistics::NestStatistics;
use crate::config::AppConfig;
use crate::landmarks::ReferencePoints;
use crate::logging::{self, Component};
use crate::model::{NestError, NestRecord, PredationStatus};
use crate::spatial::{parse_radius, SpatialFilter};
use crate::store::RecordStore;
use serde::Serialize;
use std::fmt;

// ============================================================================
// Scenario
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Scenario {
    LocationThreat {
        reference: String,
        radius_m: u32,
        target: PredationStatus,
    },
    StatusTransition {
        from: PredationStatus,
        to: PredationStatus,
    },
}

impl Scenario {
    /// Builds a location threat from the scenario form's raw radius text.
    pub fn location_threat(
        reference: &str,
        radius: &str,
        target: PredationStatus,
    ) -> Result<Self, NestError> {
        Ok(Scenario::LocationThreat {
            reference: reference.trim().to_lowercase(),
            radius_m: parse_scenario_radius(radius)?,
            target,
        })
    }

    pub fn status_transition(from: PredationStatus, to: PredationStatus) -> Self {
        Scenario::StatusTransition { from, to }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::LocationThreat {
                reference,
                radius_m,
                target,
            } => write!(f, "{} m around '{}' -> {}", radius_m, reference, target),
            Scenario::StatusTransition { from, to } => write!(f, "{} -> {}", from, to),
        }
    }
}

/// Unlike the map filter, a scenario radius that is not a whole number of
/// meters is an error rather than "no filter".
pub fn parse_scenario_radius(text: &str) -> Result<u32, NestError> {
    parse_radius(text).ok_or_else(|| {
        NestError::Validation(format!(
            "scenario radius '{}' is not a whole number of meters",
            text.trim()
        ))
    })
}

// ============================================================================
// Outcome
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    /// Records whose status the scenario targeted.
    pub affected: usize,
    pub baseline: NestStatistics,
    pub hypothetical: NestStatistics,
    /// The mutated copy.
    pub records: Vec<NestRecord>,
}

impl ScenarioOutcome {
    /// Baseline vs. hypothetical rows for the report renderer.
    pub fn comparison(&self) -> Vec<ComparisonRow> {
        compare(&self.baseline, &self.hypothetical)
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimulationEngine {
    filter: SpatialFilter,
    landmarks: ReferencePoints,
}

impl SimulationEngine {
    pub fn new(filter: SpatialFilter, landmarks: ReferencePoints) -> Self {
        Self { filter, landmarks }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            SpatialFilter::new(config.projection()),
            config.reference_points(),
        )
    }

    pub fn landmarks(&self) -> &ReferencePoints {
        &self.landmarks
    }

    /// Runs a scenario over a snapshot of records. The snapshot is not
    /// modified; on error no outcome is produced.
    pub fn run(
        &self,
        records: &[NestRecord],
        scenario: &Scenario,
    ) -> Result<ScenarioOutcome, NestError> {
        let targets: Vec<usize> = match scenario {
            Scenario::LocationThreat {
                reference,
                radius_m,
                ..
            } => {
                let origin = self.landmarks.require(reference).inspect_err(|e| {
                    logging::log_failure(Component::Simulation, None, "location scenario", e);
                })?;
                self.filter
                    .indices_within_radius(records, origin, f64::from(*radius_m))
            }
            Scenario::StatusTransition { from, .. } => records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.predation_status == *from)
                .map(|(i, _)| i)
                .collect(),
        };
        let target = match scenario {
            Scenario::LocationThreat { target, .. } => *target,
            Scenario::StatusTransition { to, .. } => *to,
        };

        let mut copy = records.to_vec();
        for &i in &targets {
            copy[i].predation_status = target;
        }
        for record in &mut copy {
            record.recompute_success_rate();
        }

        let outcome = ScenarioOutcome {
            scenario: scenario.clone(),
            affected: targets.len(),
            baseline: NestStatistics::compute(records),
            hypothetical: NestStatistics::compute(&copy),
            records: copy,
        };

        logging::info(
            Component::Simulation,
            None,
            &format!(
                "scenario [{}]: {} of {} nests affected, predation rate {}% -> {}%",
                scenario,
                outcome.affected,
                records.len(),
                outcome.baseline.predation_rate,
                outcome.hypothetical.predation_rate
            ),
        );
        Ok(outcome)
    }

    /// Reads a full snapshot from the store and runs the scenario on it.
    pub fn run_against_store<S>(
        &self,
        store: &mut S,
        scenario: &Scenario,
    ) -> Result<ScenarioOutcome, NestError>
    where
        S: RecordStore + ?Sized,
    {
        let snapshot = store.fetch_all()?;
        self.run(&snapshot, scenario)
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SpatialFilter::default(), ReferencePoints::builtin())
    }
}

// ============================================================================
// Tests
// ============================================================================
