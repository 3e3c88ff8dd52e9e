//! Lake wind monitoring: sensor observations and forecasts aggregated into
//! 15-minute buckets for a dashboard.
//!
//! The core is [`analysis::intervals::aggregate`]. Everything around it
//! fetches, validates, caches, or summarizes data for it.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod ranges;

pub use analysis::intervals::aggregate;
pub use model::{AggregatedBucket, AggregationError, FetchError, GustSource, RawObservation};
