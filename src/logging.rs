/// Structured logging for the nest monitoring core
///
/// Provides component-tagged logging with nest identifiers, timestamps,
/// and severity levels on top of `tracing`. Supports console output and
/// an append-mode activity log file.

use crate::model::{NestError, NestKey};
use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Store,
    Import,
    Geo,
    Stats,
    Simulation,
    Config,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Store => write!(f, "STORE"),
            Component::Import => write!(f, "IMPORT"),
            Component::Geo => write!(f, "GEO"),
            Component::Stats => write!(f, "STATS"),
            Component::Simulation => write!(f, "SIM"),
            Component::Config => write!(f, "CFG"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the request itself was bad (typo, duplicate, missing key)
    Expected,
    /// Unexpected failure - the database or filesystem misbehaved
    Unexpected,
    /// Unknown - could be bad input or a broken deployment
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify a failed request by its error kind
pub fn classify_failure(err: &NestError) -> FailureType {
    match err {
        NestError::Validation(_)
        | NestError::NotFound(_)
        | NestError::DuplicateKey(_)
        | NestError::InvalidGeometry(_) => FailureType::Expected,
        NestError::Database(_) | NestError::Io(_) => FailureType::Unexpected,
        // A missing landmark is either a typo or a config file that lost entries
        NestError::Config(_) => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Install the global subscriber.
///
/// Safe to call more than once; only the first call takes effect. If the
/// log file cannot be opened, logging continues on the console.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        }
    });

    let (timed, untimed) = if console_timestamps {
        (Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)), None)
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .without_time(),
            ),
        )
    };

    let _ = tracing_subscriber::registry()
        .with(min_level.filter())
        .with(timed)
        .with(untimed)
        .with(file_layer)
        .try_init();
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

fn key_part(key: Option<NestKey>) -> String {
    key.map(|k| format!(" [{}]", k)).unwrap_or_default()
}

/// Log a general informational message
pub fn info(component: Component, key: Option<NestKey>, message: &str) {
    tracing::info!("{}{}: {}", component, key_part(key), message);
}

/// Log a warning message
pub fn warn(component: Component, key: Option<NestKey>, message: &str) {
    tracing::warn!("{}{}: {}", component, key_part(key), message);
}

/// Log an error message
pub fn error(component: Component, key: Option<NestKey>, message: &str) {
    tracing::error!("{}{}: {}", component, key_part(key), message);
}

/// Log a debug message
pub fn debug(component: Component, key: Option<NestKey>, message: &str) {
    tracing::debug!("{}{}: {}", component, key_part(key), message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a failed operation with automatic classification
pub fn log_failure(component: Component, key: Option<NestKey>, operation: &str, err: &NestError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(component, key, &message),
        FailureType::Unexpected => error(component, key, &message),
        FailureType::Unknown => warn(component, key, &message),
    }
}

// ---------------------------------------------------------------------------
// Batch Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a batch operation (bulk import, bulk delete)
pub fn log_batch_summary(component: Component, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Batch complete: {}/{} successful, {} skipped",
        successful, total, failed
    );

    if failed == 0 {
        info(component, None, &message);
    } else if successful == 0 {
        error(component, None, &message);
    } else {
        warn(component, None, &message);
    }
}
