//! Query range bookkeeping for browse-by-day and forecast windows.
//!
//! All ranges are half-open `[start, end)` in UTC. Local days are computed
//! with the lake's fixed UTC offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("range end {end} is not after start {start}")]
    Empty {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("date {0} has no valid local midnight")]
    InvalidDate(NaiveDate),
}

/// A half-open UTC time range used to query observation and forecast sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RangeError> {
        if end <= start {
            return Err(RangeError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }

    /// Stable cache key, e.g. `"2024-06-01T00:00:00Z/2024-06-02T00:00:00Z"`.
    pub fn cache_key(&self) -> String {
        format!(
            "{}/{}",
            self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}

/// The UTC range covering local calendar day `date`.
pub fn day_range(date: NaiveDate, utc_offset: FixedOffset) -> Result<QueryRange, RangeError> {
    let local_midnight = |d: NaiveDate| {
        d.and_hms_opt(0, 0, 0)
            .and_then(|naive| utc_offset.from_local_datetime(&naive).single())
            .map(|local| local.with_timezone(&Utc))
    };

    let next = date.succ_opt().ok_or(RangeError::InvalidDate(date))?;
    let start = local_midnight(date).ok_or(RangeError::InvalidDate(date))?;
    let end = local_midnight(next).ok_or(RangeError::InvalidDate(next))?;
    QueryRange::new(start, end)
}

/// `[now, now + hours)`.
pub fn forecast_range(now: DateTime<Utc>, hours: i64) -> Result<QueryRange, RangeError> {
    QueryRange::new(now, now + Duration::hours(hours))
}

/// The last `days` local days ending with (and including) `today`.
pub fn trailing_days_range(
    today: NaiveDate,
    days: u32,
    utc_offset: FixedOffset,
) -> Result<QueryRange, RangeError> {
    let first = today
        .checked_sub_days(chrono::Days::new(u64::from(days.saturating_sub(1))))
        .ok_or(RangeError::InvalidDate(today))?;
    let start = day_range(first, utc_offset)?.start;
    let end = day_range(today, utc_offset)?.end;
    QueryRange::new(start, end)
}

/// The lake-local date of an instant.
pub fn local_date(time: DateTime<Utc>, utc_offset: FixedOffset) -> NaiveDate {
    time.with_timezone(&utc_offset).date_naive()
}

pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

pub fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.succ_opt()
}
