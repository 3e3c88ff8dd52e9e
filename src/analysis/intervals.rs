//! Fixed-width interval aggregation of raw wind observations.
//!
//! Raw sensor readings arrive every few seconds to minutes. Charts and lists
//! work on 15-minute summaries instead: mean speed, mean gust, and a circular
//! mean of direction for every window that actually contains data.
//!
//! # Grid
//! Windows are half-open `[start, start + 15min)` and every `start` sits on
//! the global quarter-hour grid (minute 0, 15, 30 or 45, zero seconds).
//! Empty windows produce no bucket; the output is sparse.
//!
//! # Validation
//! The whole input is checked before any bucket is computed. An invalid
//! value or an out-of-order timestamp fails the call with no partial output.

use chrono::{DateTime, Duration, Utc};

use crate::analysis::direction::direction_from_components;
use crate::model::{AggregatedBucket, AggregationError, GustSource, RawObservation};

/// Width of one aggregation window.
pub const INTERVAL_MINUTES: i64 = 15;

const INTERVAL_SECS: i64 = INTERVAL_MINUTES * 60;

// ---------------------------------------------------------------------------
// Grid alignment
// ---------------------------------------------------------------------------

/// Floors a timestamp to the start of its 15-minute window, truncating
/// seconds and sub-seconds.
pub fn interval_floor(time: DateTime<Utc>) -> DateTime<Utc> {
    let into_window = Duration::seconds(time.timestamp().rem_euclid(INTERVAL_SECS))
        + Duration::nanoseconds(i64::from(time.timestamp_subsec_nanos()));
    // MIN_UTC is midnight, so it is itself on the grid.
    time.checked_sub_signed(into_window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// End of the window starting at `start`, or `None` when it lies past the
/// last representable instant.
fn interval_end(start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::minutes(INTERVAL_MINUTES))
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    sum_speed: f64,
    sum_gust: f64,
    sum_sin: f64,
    sum_cos: f64,
    gust_estimated: bool,
}

impl Accumulator {
    fn add(&mut self, obs: &RawObservation) {
        let rad = obs.wind_direction.to_radians();
        self.count += 1;
        self.sum_speed += obs.wind_speed;
        self.sum_gust += obs.wind_gust;
        self.sum_sin += rad.sin();
        self.sum_cos += rad.cos();
        self.gust_estimated |= obs.gust_source == GustSource::Estimated;
    }

    /// Closes the current window, resetting the accumulator. Returns `None`
    /// if nothing was accumulated.
    fn take_bucket(&mut self, interval_start: DateTime<Utc>) -> Option<AggregatedBucket> {
        let acc = std::mem::take(self);
        if acc.count == 0 {
            return None;
        }

        let n = acc.count as f64;
        Some(AggregatedBucket {
            interval_start,
            mean_wind_speed: acc.sum_speed / n,
            mean_wind_gust: acc.sum_gust / n,
            mean_wind_direction: direction_from_components(acc.sum_sin / n, acc.sum_cos / n),
            observation_count: acc.count,
            gust_estimated: acc.gust_estimated,
        })
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Checks that every observation is finite, speeds and gusts are
/// non-negative, and times are non-decreasing.
pub fn validate(observations: &[RawObservation]) -> Result<(), AggregationError> {
    for (index, obs) in observations.iter().enumerate() {
        let fields = [
            ("wind_speed", obs.wind_speed, true),
            ("wind_gust", obs.wind_gust, true),
            ("wind_direction", obs.wind_direction, false),
        ];
        for (field, value, non_negative) in fields {
            if !value.is_finite() || (non_negative && value < 0.0) {
                return Err(AggregationError::InvalidObservation { index, field, value });
            }
        }

        if index > 0 {
            let previous = observations[index - 1].time;
            if obs.time < previous {
                return Err(AggregationError::OrderingViolation {
                    index,
                    previous,
                    current: obs.time,
                });
            }
        }
    }
    Ok(())
}

/// Aggregates time-ordered observations into sparse 15-minute buckets.
///
/// Buckets come out with strictly increasing `interval_start`. An observation
/// exactly on a window's end boundary belongs to the next window.
pub fn aggregate(observations: &[RawObservation]) -> Result<Vec<AggregatedBucket>, AggregationError> {
    validate(observations)?;

    let Some(first) = observations.first() else {
        return Ok(Vec::new());
    };

    let mut interval_start = interval_floor(first.time);
    let mut acc = Accumulator::default();
    let mut buckets = Vec::new();

    for obs in observations {
        if interval_end(interval_start).is_some_and(|end| obs.time >= end) {
            buckets.extend(acc.take_bucket(interval_start));
            // Empty windows in a gap emit nothing, so jump straight to the
            // observation's own window. It is on the same grid.
            interval_start = interval_floor(obs.time);
        }
        acc.add(obs);
    }
    buckets.extend(acc.take_bucket(interval_start));

    Ok(buckets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
