//! Wind data analysis for the lake dashboard.
//!
//! Everything here is pure computation over already-fetched observations;
//! fetching lives in `ingest`.
//!
//! Submodules:
//! - `intervals`  — 15-minute bucket aggregation with circular direction mean.
//! - `direction`  — angle normalization, circular mean, compass labels.
//! - `rating`     — wind strength categories and their colour scale.
//! - `windy_days` — per-day summaries and the paged windy-day history.

pub mod direction;
pub mod intervals;
pub mod rating;
pub mod windy_days;
