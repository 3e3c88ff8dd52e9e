//! Data sources feeding the aggregator.
//!
//! Submodules:
//! - `observations` — wind sensor readings from PostgreSQL, with caching.
//! - `forecast`     — MET Norway Locationforecast client.

pub mod forecast;
pub mod observations;
