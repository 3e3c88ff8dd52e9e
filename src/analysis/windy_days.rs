//! Per-day wind statistics and the paged "windy days" history.
//!
//! Days are local calendar days at the lake, computed with a fixed UTC
//! offset from configuration.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::direction::circular_mean;
use crate::analysis::intervals::INTERVAL_MINUTES;
use crate::model::AggregatedBucket;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Thresholds (m/s) that make a day "windy". Either one is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindyDayCriteria {
    pub min_mean_speed: f64,
    pub min_max_gust: f64,
}

impl Default for WindyDayCriteria {
    fn default() -> Self {
        Self {
            min_mean_speed: 8.0,
            min_max_gust: 14.0,
        }
    }
}

impl WindyDayCriteria {
    pub fn is_windy(&self, day: &DaySummary) -> bool {
        day.mean_wind_speed >= self.min_mean_speed || day.max_wind_gust >= self.min_max_gust
    }
}

/// Statistics for one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub bucket_count: usize,
    /// Mean of the day's bucket means; every bucket spans the same time.
    pub mean_wind_speed: f64,
    /// Highest 15-minute mean speed of the day.
    pub max_wind_speed: f64,
    /// Highest 15-minute mean gust of the day, not the single peak reading.
    pub max_wind_gust: f64,
    /// `None` when the day's directions cancel out.
    pub mean_wind_direction: Option<f64>,
    /// Minutes covered by buckets whose mean speed reached the windy threshold.
    pub windy_minutes: i64,
}

/// One page of a longer list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Groups buckets by local date and summarizes each day, oldest first.
pub fn summarize_days(
    buckets: &[AggregatedBucket],
    utc_offset: FixedOffset,
    criteria: &WindyDayCriteria,
) -> Vec<DaySummary> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&AggregatedBucket>> = BTreeMap::new();
    for bucket in buckets {
        let date = bucket.interval_start.with_timezone(&utc_offset).date_naive();
        by_day.entry(date).or_default().push(bucket);
    }

    by_day
        .into_iter()
        .map(|(date, day)| {
            let n = day.len() as f64;
            let windy_buckets = day
                .iter()
                .filter(|b| b.mean_wind_speed >= criteria.min_mean_speed)
                .count() as i64;

            DaySummary {
                date,
                bucket_count: day.len(),
                mean_wind_speed: day.iter().map(|b| b.mean_wind_speed).sum::<f64>() / n,
                max_wind_speed: day.iter().map(|b| b.mean_wind_speed).fold(0.0, f64::max),
                max_wind_gust: day.iter().map(|b| b.mean_wind_gust).fold(0.0, f64::max),
                mean_wind_direction: circular_mean(day.iter().map(|b| b.mean_wind_direction)),
                windy_minutes: windy_buckets * INTERVAL_MINUTES,
            }
        })
        .collect()
}

/// Days meeting `criteria`, newest first.
pub fn windy_days(summaries: &[DaySummary], criteria: &WindyDayCriteria) -> Vec<DaySummary> {
    let mut windy: Vec<DaySummary> = summaries
        .iter()
        .filter(|d| criteria.is_windy(d))
        .cloned()
        .collect();
    windy.sort_by(|a, b| b.date.cmp(&a.date));
    windy
}

/// Returns zero-based page `page` of `items`. A page past the end is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Result<Page<T>, PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::ZeroPageSize);
    }

    let total_items = items.len();
    let start = page.saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);

    Ok(Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items,
        total_pages: total_items.div_ceil(page_size),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn bucket(start: DateTime<Utc>, speed: f64, gust: f64, dir: f64) -> AggregatedBucket {
        AggregatedBucket {
            interval_start: start,
            mean_wind_speed: speed,
            mean_wind_gust: gust,
            mean_wind_direction: dir,
            observation_count: 4,
            gust_estimated: false,
        }
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn summary(d: u32, mean: f64, gust: f64) -> DaySummary {
        DaySummary {
            date: date(d),
            bucket_count: 1,
            mean_wind_speed: mean,
            max_wind_speed: mean,
            max_wind_gust: gust,
            mean_wind_direction: Some(180.0),
            windy_minutes: 0,
        }
    }

    #[test]
    fn test_summaries_group_by_local_date() {
        // 23:30 UTC on the 1st is already the 2nd at UTC+2.
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let buckets = [
            bucket(utc(1, 10, 0), 2.0, 3.0, 90.0),
            bucket(utc(1, 23, 30), 6.0, 9.0, 90.0),
            bucket(utc(2, 6, 0), 10.0, 15.0, 90.0),
        ];
        let days = summarize_days(&buckets, offset, &WindyDayCriteria::default());
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[0].bucket_count, 1);
        assert_eq!(days[1].date, date(2));
        assert_eq!(days[1].bucket_count, 2);
        assert_eq!(days[1].mean_wind_speed, 8.0);
        assert_eq!(days[1].max_wind_speed, 10.0);
        assert_eq!(days[1].max_wind_gust, 15.0);
    }

    #[test]
    fn test_day_maxima_come_from_bucket_means() {
        let buckets = [
            bucket(utc(5, 9, 0), 4.0, 12.5, 0.0),
            bucket(utc(5, 9, 15), 6.5, 11.0, 0.0),
        ];
        let days = summarize_days(&buckets, FixedOffset::east_opt(0).unwrap(), &WindyDayCriteria::default());
        assert_eq!(days[0].max_wind_speed, 6.5);
        assert_eq!(days[0].max_wind_gust, 12.5);
        assert!(!WindyDayCriteria::default().is_windy(&days[0]));
    }

    #[test]
    fn test_windy_minutes_count_whole_buckets() {
        let criteria = WindyDayCriteria {
            min_mean_speed: 5.0,
            min_max_gust: 100.0,
        };
        let buckets = [
            bucket(utc(3, 12, 0), 5.0, 6.0, 0.0),
            bucket(utc(3, 12, 15), 7.0, 6.0, 0.0),
            bucket(utc(3, 12, 30), 4.9, 6.0, 0.0),
        ];
        let days = summarize_days(&buckets, FixedOffset::east_opt(0).unwrap(), &criteria);
        assert_eq!(days[0].windy_minutes, 30);
    }

    #[test]
    fn test_day_direction_is_circular() {
        let buckets = [
            bucket(utc(4, 1, 0), 3.0, 4.0, 340.0),
            bucket(utc(4, 2, 0), 3.0, 4.0, 20.0),
        ];
        let days = summarize_days(&buckets, FixedOffset::east_opt(0).unwrap(), &WindyDayCriteria::default());
        let dir = days[0].mean_wind_direction.expect("direction should exist");
        assert!(dir < 1e-6 || dir > 360.0 - 1e-6, "got {}", dir);
    }

    #[test]
    fn test_windy_days_match_either_threshold_newest_first() {
        let criteria = WindyDayCriteria {
            min_mean_speed: 8.0,
            min_max_gust: 14.0,
        };
        let summaries = [
            summary(1, 9.0, 10.0),  // mean qualifies
            summary(2, 3.0, 5.0),   // calm
            summary(3, 4.0, 14.0),  // gust qualifies
        ];
        let windy = windy_days(&summaries, &criteria);
        let dates: Vec<_> = windy.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(3), date(1)]);
    }

    #[test]
    fn test_paginate_splits_and_counts_pages() {
        let items: Vec<u32> = (0..25).collect();
        let first = paginate(&items, 0, 10).unwrap();
        assert_eq!(first.items, (0..10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 25);

        let last = paginate(&items, 2, 10).unwrap();
        assert_eq!(last.items, (20..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let items = [1, 2, 3];
        let page = paginate(&items, 7, 2).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_paginate_rejects_zero_page_size() {
        assert_eq!(paginate(&[1, 2], 0, 0), Err(PaginationError::ZeroPageSize));
    }
}
