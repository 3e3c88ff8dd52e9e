//! Core data types for the lake wind monitoring service.
//!
//! This module defines the shared domain model imported by all other modules:
//! raw sensor observations, the 15-minute buckets produced from them, forecast
//! points, and the error enums for each concern. It contains no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// Where a gust value came from.
///
/// The wind sensor measures gusts directly. The forecast API frequently omits
/// them, in which case a gust is synthesized from the forecast speed. Keeping
/// the distinction on the record lets rating and colouring code tell the two
/// apart instead of silently mixing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GustSource {
    #[default]
    Measured,
    Estimated,
}

/// A single validated wind observation.
///
/// Speeds are in meters/second, direction in degrees (the direction the wind
/// blows *from*). Direction is not required to be pre-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub time: DateTime<Utc>,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub wind_direction: f64,
    #[serde(default)]
    pub gust_source: GustSource,
}

impl RawObservation {
    /// A sensor observation with a measured gust.
    pub fn measured(time: DateTime<Utc>, wind_speed: f64, wind_gust: f64, wind_direction: f64) -> Self {
        Self {
            time,
            wind_speed,
            wind_gust,
            wind_direction,
            gust_source: GustSource::Measured,
        }
    }
}

/// One non-empty 15-minute window summarized from raw observations.
///
/// Covers the half-open window `[interval_start, interval_start + 15min)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    pub interval_start: DateTime<Utc>,
    pub mean_wind_speed: f64,
    pub mean_wind_gust: f64,
    /// Circular mean, normalized to [0, 360).
    pub mean_wind_direction: f64,
    pub observation_count: usize,
    /// True if any contributing observation carried an estimated gust.
    pub gust_estimated: bool,
}

/// An observation as the database or a document export delivers it, before
/// validation. Every field may be missing or malformed.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ObservationRecord {
    pub time: String, // RFC 3339, e.g. "2024-06-01T12:07:00Z"
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_direction: Option<f64>,
}

impl TryFrom<&ObservationRecord> for RawObservation {
    type Error = RecordError;

    fn try_from(record: &ObservationRecord) -> Result<Self, Self::Error> {
        let time = DateTime::parse_from_rfc3339(record.time.trim())
            .map_err(|_| RecordError::InvalidTime(record.time.clone()))?
            .with_timezone(&Utc);

        let finite = |field: &'static str, value: Option<f64>| match value {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(RecordError::NonFinite { field, value: v }),
            None => Err(RecordError::MissingField(field)),
        };

        Ok(RawObservation::measured(
            time,
            finite("wind_speed", record.wind_speed)?,
            finite("wind_gust", record.wind_gust)?,
            finite("wind_direction", record.wind_direction)?,
        ))
    }
}

/// Converts source records into observations, dropping any that fail
/// validation, and sorts the survivors ascending by time.
///
/// Returns the valid observations and the number of records dropped.
pub fn filter_valid(records: &[ObservationRecord]) -> (Vec<RawObservation>, usize) {
    let mut observations: Vec<RawObservation> = records
        .iter()
        .filter_map(|r| RawObservation::try_from(r).ok())
        .collect();
    let dropped = records.len() - observations.len();

    observations.sort_by_key(|o| o.time);
    (observations, dropped)
}

// ---------------------------------------------------------------------------
// Forecast types
// ---------------------------------------------------------------------------

/// Default multiplier used to estimate a gust from a forecast wind speed.
pub const DEFAULT_GUST_FACTOR: f64 = 1.5;

/// A single point from the short-term forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub wind_speed: f64,
    pub wind_direction: f64,
    /// Present only when the forecast provider publishes a gust value.
    pub wind_gust: Option<f64>,
}

impl ForecastPoint {
    /// Converts the point into an observation-compatible record.
    ///
    /// A missing gust is estimated as `wind_speed * gust_factor` and tagged
    /// [`GustSource::Estimated`].
    pub fn into_observation(self, gust_factor: f64) -> RawObservation {
        let (wind_gust, gust_source) = match self.wind_gust {
            Some(g) => (g, GustSource::Measured),
            None => (self.wind_speed * gust_factor, GustSource::Estimated),
        };
        RawObservation {
            time: self.time,
            wind_speed: self.wind_speed,
            wind_gust,
            wind_direction: self.wind_direction,
            gust_source,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a source record is rejected before aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Invalid timestamp: {0:?}")]
    InvalidTime(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Non-finite value for {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// Errors raised by the interval aggregator.
///
/// The whole input is validated before any bucket is computed, so an error
/// always means no output at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// A numeric field is NaN/infinite, or a speed/gust is negative.
    #[error("Invalid observation at index {index}: {field} = {value}")]
    InvalidObservation {
        index: usize,
        field: &'static str,
        value: f64,
    },
    /// The input is not sorted ascending by time.
    #[error("Observation at index {index} ({current}) is earlier than its predecessor ({previous})")]
    OrderingViolation {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// Errors that can arise when fetching observations or forecasts.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx HTTP response from the forecast API.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The observation database query failed.
    #[error("Database error: {0}")]
    Database(#[from] postgres::Error),
    /// The source answered but had nothing for the requested range.
    #[error("No data available for {0}")]
    NoData(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
