//! Wind sensor observation source
//!
//! Observations are stored one row per sensor reading in
//! `wind.observations(station_id, observed_at, wind_speed, wind_gust,
//! wind_direction)`. Numeric columns are nullable; rows with gaps are dropped
//! during validation, never passed on to aggregation.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};
use tracing::debug;

use crate::cache::ObservationCache;
use crate::logging::{self, DataSource};
use crate::model::{filter_valid, FetchError, ObservationRecord, RawObservation};
use crate::ranges::QueryRange;

/// Anything that can answer "which raw records fall in this range".
pub trait ObservationSource {
    fn fetch(&mut self, range: &QueryRange) -> Result<Vec<ObservationRecord>, FetchError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL source
// ---------------------------------------------------------------------------

pub struct PostgresObservationSource {
    client: Client,
    station_id: String,
}

impl PostgresObservationSource {
    pub fn connect(database_url: &str, station_id: &str) -> Result<Self, FetchError> {
        let client = Client::connect(database_url, NoTls)?;
        Ok(Self {
            client,
            station_id: station_id.to_string(),
        })
    }
}

impl ObservationSource for PostgresObservationSource {
    fn fetch(&mut self, range: &QueryRange) -> Result<Vec<ObservationRecord>, FetchError> {
        let rows = self.client.query(
            "SELECT observed_at, wind_speed, wind_gust, wind_direction
             FROM wind.observations
             WHERE station_id = $1
               AND observed_at >= $2
               AND observed_at < $3
             ORDER BY observed_at",
            &[&self.station_id, &range.start, &range.end],
        )?;

        Ok(rows
            .iter()
            .map(|row| ObservationRecord {
                time: row.get::<_, DateTime<Utc>>(0).to_rfc3339(),
                wind_speed: row.get(1),
                wind_gust: row.get(2),
                wind_direction: row.get(3),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Cached access
// ---------------------------------------------------------------------------

/// An observation source fronted by an `ObservationCache`.
pub struct CachedObservations<S> {
    source: S,
    cache: ObservationCache,
}

impl<S: ObservationSource> CachedObservations<S> {
    pub fn new(source: S, cache: ObservationCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &ObservationCache {
        &self.cache
    }

    /// Valid, time-sorted observations for `range`.
    ///
    /// A fresh cache entry is returned as-is. Otherwise the source is queried,
    /// invalid records are dropped, stale entries are evicted, and the result
    /// is cached at `now`. A fetch error leaves the cache untouched.
    pub fn observations_at(
        &mut self,
        range: &QueryRange,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawObservation>, FetchError> {
        let key = range.cache_key();
        if let Some(cached) = self.cache.get_at(&key, now) {
            debug!(source = %DataSource::Cache, %key, count = cached.len(), "cache hit");
            return Ok(cached.to_vec());
        }

        let records = match self.source.fetch(range) {
            Ok(records) => records,
            Err(e) => {
                logging::log_fetch_failure(DataSource::Observations, "fetch observations", &e);
                return Err(e);
            }
        };

        let (observations, dropped) = filter_valid(&records);
        logging::log_dropped_records(DataSource::Observations, &key, records.len(), dropped);

        let evicted = self.cache.evict_stale_at(now);
        if evicted > 0 {
            debug!(source = %DataSource::Cache, evicted, "evicted stale entries");
        }
        self.cache.set_at(&key, observations.clone(), now);
        Ok(observations)
    }

    pub fn observations(&mut self, range: &QueryRange) -> Result<Vec<RawObservation>, FetchError> {
        self.observations_at(range, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
