//! Structured logging for the wind monitoring service
//!
//! Events go through `tracing` with a `source` field naming the data source
//! involved. Fetch failures are classified before logging so that expected
//! gaps (sensor offline, empty range) stay at debug/warn while service
//! problems surface as errors.

use std::fmt;

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::model::FetchError;

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Observations,
    Forecast,
    Cache,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Observations => write!(f, "OBS"),
            DataSource::Forecast => write!(f, "FCST"),
            DataSource::Cache => write!(f, "CACHE"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the sensor was offline or the range simply has no data
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
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

/// Classify a fetch failure.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        FetchError::NoData(_) => FailureType::Expected,
        FetchError::Http(_) | FetchError::Database(_) => FailureType::Unexpected,
        // Parse errors suggest API changes or bugs
        FetchError::Parse(_) => FailureType::Unexpected,
        FetchError::Request(e) if e.is_timeout() || e.is_connect() => FailureType::Unknown,
        FetchError::Request(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Installs the global fmt subscriber. `RUST_LOG` overrides `default_level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a data source failure with automatic classification
pub fn log_fetch_failure(source: DataSource, operation: &str, err: &FetchError) -> FailureType {
    let failure_type = classify_fetch_failure(err);
    let source = source.to_string();

    match failure_type {
        FailureType::Expected => debug!(%source, operation, "{} failed [{}]: {}", operation, failure_type, err),
        FailureType::Unexpected => error!(%source, operation, "{} failed [{}]: {}", operation, failure_type, err),
        FailureType::Unknown => warn!(%source, operation, "{} failed [{}]: {}", operation, failure_type, err),
    }
    failure_type
}

// ---------------------------------------------------------------------------
// Validation and Aggregation Summary Logging
// ---------------------------------------------------------------------------

/// Log records dropped during validation of one fetch.
pub fn log_dropped_records(source: DataSource, key: &str, total: usize, dropped: usize) {
    if dropped == 0 {
        return;
    }
    let source = source.to_string();
    if dropped == total {
        warn!(%source, key, dropped, "All {} records for {} failed validation", total, key);
    } else {
        debug!(%source, key, dropped, "Dropped {}/{} invalid records for {}", dropped, total, key);
    }
}

/// Log a summary of one aggregation run.
pub fn log_aggregation_summary(source: DataSource, observations: usize, buckets: usize) {
    let source = source.to_string();
    if observations == 0 {
        warn!(%source, "Aggregation produced no chart data: no valid observations");
    } else {
        info!(%source, observations, buckets, "Aggregated {} observations into {} buckets", observations, buckets);
    }
}
