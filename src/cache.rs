//! Observation query cache with explicit staleness.
//!
//! Observations for a query range are cached under the range's key together
//! with the time they were stored. An entry older than the TTL is stale and
//! is treated as a miss.
//!
//! # Clock injection
//! All core methods accept a `now: DateTime<Utc>` parameter rather than
//! calling `Utc::now()` internally. The wrappers without `_at` use the real
//! clock. Tests use the `*_at` forms so staleness is fully deterministic.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::model::RawObservation;

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    observations: Vec<RawObservation>,
}

/// Maps a query key (see `QueryRange::cache_key`) to timestamped results.
#[derive(Debug, Clone)]
pub struct ObservationCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl ObservationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `observations` under `key`, replacing any previous entry.
    pub fn set_at(&mut self, key: &str, observations: Vec<RawObservation>, now: DateTime<Utc>) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                stored_at: now,
                observations,
            },
        );
    }

    /// Returns `true` if `key` is missing or older than the TTL relative to
    /// `now`.
    ///
    /// Staleness is strictly greater than the TTL:
    ///   age > ttl  →  stale
    ///   age == ttl →  fresh
    pub fn is_stale_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        match self.entries.get(key) {
            Some(entry) => now - entry.stored_at > self.ttl,
            None => true,
        }
    }

    /// Cached observations for `key`, or `None` if missing or stale.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<&[RawObservation]> {
        if self.is_stale_at(key, now) {
            return None;
        }
        self.entries.get(key).map(|e| e.observations.as_slice())
    }

    /// Drops every stale entry. Returns how many were removed.
    pub fn evict_stale_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now - e.stored_at <= ttl);
        before - self.entries.len()
    }

    pub fn set(&mut self, key: &str, observations: Vec<RawObservation>) {
        self.set_at(key, observations, Utc::now());
    }

    pub fn is_stale(&self, key: &str) -> bool {
        self.is_stale_at(key, Utc::now())
    }

    pub fn get(&self, key: &str) -> Option<&[RawObservation]> {
        self.get_at(key, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// A fixed "now" used across all tests: 2024-06-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap()
    }

    fn sample() -> Vec<RawObservation> {
        vec![RawObservation::measured(fixed_now(), 4.0, 6.0, 200.0)]
    }

    fn cache_with_entry() -> ObservationCache {
        let mut cache = ObservationCache::new(Duration::minutes(10));
        cache.set_at("day-1", sample(), fixed_now());
        cache
    }

    #[test]
    fn test_missing_key_is_stale() {
        let cache = ObservationCache::new(Duration::minutes(10));
        assert!(cache.is_stale_at("nope", fixed_now()));
        assert!(cache.get_at("nope", fixed_now()).is_none());
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = cache_with_entry();
        let later = fixed_now() + Duration::minutes(5);
        let expected = sample();
        assert!(!cache.is_stale_at("day-1", later));
        assert_eq!(cache.get_at("day-1", later), Some(expected.as_slice()));
    }

    #[test]
    fn test_entry_exactly_at_ttl_is_fresh() {
        let cache = cache_with_entry();
        let at_ttl = fixed_now() + Duration::minutes(10);
        assert!(
            !cache.is_stale_at("day-1", at_ttl),
            "age equal to the TTL should not be stale; staleness is strictly greater than",
        );
    }

    #[test]
    fn test_entry_past_ttl_is_stale_and_hidden() {
        let cache = cache_with_entry();
        let past = fixed_now() + Duration::minutes(10) + Duration::seconds(1);
        assert!(cache.is_stale_at("day-1", past));
        assert!(cache.get_at("day-1", past).is_none());
    }

    #[test]
    fn test_set_replaces_and_refreshes_entry() {
        let mut cache = cache_with_entry();
        let later = fixed_now() + Duration::minutes(30);
        cache.set_at("day-1", Vec::new(), later);
        assert_eq!(cache.get_at("day-1", later), Some(&[] as &[RawObservation]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_removes_only_stale_entries() {
        let mut cache = cache_with_entry();
        cache.set_at("day-2", sample(), fixed_now() + Duration::minutes(20));
        let removed = cache.evict_stale_at(fixed_now() + Duration::minutes(25));
        assert_eq!(removed, 1);
        assert!(cache.get_at("day-2", fixed_now() + Duration::minutes(25)).is_some());
        assert!(cache.get_at("day-1", fixed_now()).is_none());
    }

    #[test]
    fn test_wall_clock_wrappers() {
        let mut cache = ObservationCache::new(Duration::minutes(10));
        assert!(cache.is_stale("live"));
        cache.set("live", sample());
        assert!(!cache.is_stale("live"));
        let expected = sample();
        assert_eq!(cache.get("live"), Some(expected.as_slice()));

        let mut expired = ObservationCache::new(Duration::seconds(-1));
        expired.set("live", sample());
        assert!(expired.is_stale("live"));
        assert!(expired.get("live").is_none());
    }
}
