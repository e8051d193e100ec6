//! Application configuration.
//!
//! Parses `nestmon.toml`, the declarative config for the projection used
//! by the spatial engine, logging, and the reference point registry. When
//! the file does not exist it is created with the built-in defaults so
//! field staff have something to edit.
//!
//! ```toml
//! [projection]
//! utm_zone = 35
//! northern = true
//!
//! [logging]
//! level = "info"
//! file = "activity_log.txt"
//! timestamps = true
//!
//! [reference_points]
//! "dağ" = [36.2486, 29.3157]
//! ```

use crate::landmarks::ReferencePoints;
use crate::logging::{self, Component, LogLevel};
use crate::model::NestError;
use crate::spatial::projection::UtmProjection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "nestmon.toml";

// ============================================================================
// AppConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Landmark name → `[lat, lon]`.
    #[serde(default = "default_reference_points")]
    pub reference_points: IndexMap<String, [f64; 2]>,
}

/// Projected CRS used for all metric distance and containment tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// UTM zone number, 1–60. Zone 35 covers 24°E–30°E.
    #[serde(default = "default_utm_zone")]
    pub utm_zone: u8,
    #[serde(default = "default_true")]
    pub northern: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Append-mode activity log file.
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

fn default_utm_zone() -> u8 { 35 }
fn default_true() -> bool { true }
fn default_level() -> String { "info".to_string() }
fn default_log_file() -> Option<String> { Some("activity_log.txt".to_string()) }

fn default_reference_points() -> IndexMap<String, [f64; 2]> {
    ReferencePoints::builtin().to_pairs()
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            utm_zone: default_utm_zone(),
            northern: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: default_log_file(),
            timestamps: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            logging: LoggingConfig::default(),
            reference_points: default_reference_points(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl AppConfig {
    /// Parses and validates configuration text.
    pub fn from_toml(text: &str) -> Result<Self, NestError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration at `path`, or writes and returns the
    /// defaults if the file is absent.
    pub fn load_or_init(path: &Path) -> Result<Self, NestError> {
        if !path.exists() {
            let config = AppConfig::default();
            config.save(path)?;
            logging::info(
                Component::Config,
                None,
                &format!("Wrote default configuration to {}", path.display()),
            );
            return Ok(config);
        }

        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| NestError::Config(format!("{}: {}", path.display(), e)))?;
        logging::debug(
            Component::Config,
            None,
            &format!(
                "Loaded {} reference points from {}",
                config.reference_points.len(),
                path.display()
            ),
        );
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), NestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), NestError> {
        if !(1..=60).contains(&self.projection.utm_zone) {
            return Err(NestError::Config(format!(
                "utm_zone must be between 1 and 60, got {}",
                self.projection.utm_zone
            )));
        }
        if self.log_level().is_none() {
            return Err(NestError::Config(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }
        for (name, [lat, lon]) in &self.reference_points {
            if !(-90.0..=90.0).contains(lat) || !(-180.0..=180.0).contains(lon) {
                return Err(NestError::Config(format!(
                    "reference point '{}' has invalid coordinates [{}, {}]",
                    name, lat, lon
                )));
            }
        }
        Ok(())
    }

    pub fn reference_points(&self) -> ReferencePoints {
        ReferencePoints::from_pairs(self.reference_points.clone())
    }

    pub fn projection(&self) -> UtmProjection {
        UtmProjection::new(self.projection.utm_zone, self.projection.northern)
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        LogLevel::parse(&self.logging.level)
    }

    /// Installs the global logger from the `[logging]` section.
    pub fn init_logging(&self) {
        logging::init_logger(
            self.log_level().unwrap_or(LogLevel::Info),
            self.logging.file.as_deref(),
            self.logging.timestamps,
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join(DEFAULT_CONFIG_FILE);

        let config = AppConfig::load_or_init(&path).unwrap();
        assert!(path.exists(), "defaults should be persisted");
        assert_eq!(config.reference_points.len(), 12);
        assert_eq!(config.projection.utm_zone, 35);

        let reloaded = AppConfig::load_or_init(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [reference_points]
            "Feneri" = [36.25, 29.30]
            "#,
        )
        .unwrap();
        assert_eq!(config.projection, ProjectionConfig::default());
        assert_eq!(config.logging.level, "info");

        let points = config.reference_points();
        assert_eq!(points.len(), 1);
        assert!(points.find("feneri").is_some());
    }

    #[test]
    fn test_empty_file_gets_builtin_landmarks() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.reference_points().len(), 12);
    }

    #[test]
    fn test_invalid_zone_is_rejected() {
        let result = AppConfig::from_toml("[projection]\nutm_zone = 61\n");
        assert!(matches!(result, Err(NestError::Config(_))));
    }

    #[test]
    fn test_invalid_coordinates_are_rejected() {
        let result = AppConfig::from_toml("[reference_points]\nx = [95.0, 29.0]\n");
        assert!(matches!(result, Err(NestError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[reference_points\n").unwrap();
        assert!(matches!(AppConfig::load_or_init(&path), Err(NestError::Config(_))));
    }
}
