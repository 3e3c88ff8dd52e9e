//! Service configuration loaded from `windmon.toml`.
//!
//! Only `[location]` is required; every other section falls back to
//! defaults. The database connection string is not part of the file and is
//! read from `DATABASE_URL` (optionally via a `.env` file).

use std::path::Path;

use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::analysis::windy_days::WindyDayCriteria;
use crate::model::DEFAULT_GUST_FACTOR;

pub const DEFAULT_CONFIG_PATH: &str = "./windmon.toml";

const DEFAULT_FORECAST_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0/complete";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub location: LocationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub windy_days: WindyDaysConfig,
}

/// The monitored lake and its wind sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    /// Sensor identifier in the observations table.
    pub station_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Fixed local offset used to cut calendar days.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_minutes: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    /// MET Norway rejects requests without an identifying User-Agent.
    pub user_agent: String,
    pub gust_factor: f64,
    pub hours: i64,
    pub timeout_secs: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FORECAST_URL.to_string(),
            user_agent: concat!("windmon/", env!("CARGO_PKG_VERSION")).to_string(),
            gust_factor: DEFAULT_GUST_FACTOR,
            hours: 48,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindyDaysConfig {
    pub min_mean_speed: f64,
    pub min_max_gust: f64,
    pub page_size: usize,
}

impl Default for WindyDaysConfig {
    fn default() -> Self {
        let criteria = WindyDayCriteria::default();
        Self {
            min_mean_speed: criteria.min_mean_speed,
            min_max_gust: criteria.min_max_gust,
            page_size: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let loc = &self.location;
        if !(-90.0..=90.0).contains(&loc.latitude) {
            return Err(ConfigError::Invalid(format!("latitude {} out of range", loc.latitude)));
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(ConfigError::Invalid(format!("longitude {} out of range", loc.longitude)));
        }
        if loc.utc_offset_minutes.abs() > 18 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} beyond ±18h",
                loc.utc_offset_minutes
            )));
        }
        if self.cache.ttl_minutes < 0 {
            return Err(ConfigError::Invalid("cache.ttl_minutes must not be negative".into()));
        }
        if self.forecast.gust_factor.is_nan() || self.forecast.gust_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "forecast.gust_factor {} must be at least 1.0",
                self.forecast.gust_factor
            )));
        }
        if self.forecast.hours <= 0 {
            return Err(ConfigError::Invalid("forecast.hours must be positive".into()));
        }
        if self.windy_days.page_size == 0 {
            return Err(ConfigError::Invalid("windy_days.page_size must be positive".into()));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> FixedOffset {
        // Range checked in validate(); UTC is the fallback for hand-built configs.
        FixedOffset::east_opt(self.location.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::minutes(self.cache.ttl_minutes)
    }

    pub fn windy_criteria(&self) -> WindyDayCriteria {
        WindyDayCriteria {
            min_mean_speed: self.windy_days.min_mean_speed,
            min_max_gust: self.windy_days.min_max_gust,
        }
    }
}

/// Loads and validates the configuration file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Config::from_toml_str(&content)
}

/// Reads `DATABASE_URL`, loading `.env` first if present.
pub fn database_url() -> Result<String, ConfigError> {
    dotenv::dotenv().ok();
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
