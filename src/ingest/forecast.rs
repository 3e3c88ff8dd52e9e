//! MET Norway Locationforecast 2.0 client
//!
//! Retrieves the short-term point forecast for the lake and turns it into
//! `ForecastPoint`s. Gusts are only published in the `complete` product and
//! not for every time step; missing gusts are estimated later by
//! `ForecastPoint::into_observation`.
//!
//! API Documentation: https://api.met.no/weatherapi/locationforecast/2.0/documentation

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, ForecastConfig};
use crate::model::{FetchError, ForecastPoint, RawObservation};
use crate::ranges::QueryRange;

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    pub timeseries: Vec<ForecastStep>,
}

/// One forecast time step.
#[derive(Debug, Deserialize)]
pub struct ForecastStep {
    pub time: String, // ISO 8601, e.g. "2024-06-01T12:00:00Z"
    pub data: ForecastStepData,
}

#[derive(Debug, Deserialize)]
pub struct ForecastStepData {
    pub instant: ForecastInstant,
}

#[derive(Debug, Deserialize)]
pub struct ForecastInstant {
    pub details: InstantDetails,
}

#[derive(Debug, Deserialize)]
pub struct InstantDetails {
    pub wind_speed: Option<f64>,          // m/s
    pub wind_from_direction: Option<f64>, // degrees
    pub wind_speed_of_gust: Option<f64>,  // m/s, `complete` product only
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Builds the request URL. Coordinates are truncated to 4 decimals, as the
/// API asks of clients.
pub fn build_forecast_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}?lat={:.4}&lon={:.4}",
        base_url.trim_end_matches('/'),
        latitude,
        longitude
    )
}

/// Builds a blocking HTTP client with the configured User-Agent and timeout.
pub fn build_client(forecast: &ForecastConfig) -> Result<reqwest::blocking::Client, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(forecast.user_agent.clone())
        .timeout(Duration::from_secs(forecast.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch forecast points for the configured location within `range`.
pub fn fetch_forecast(
    client: &reqwest::blocking::Client,
    config: &Config,
    range: &QueryRange,
) -> Result<Vec<ForecastPoint>, FetchError> {
    let url = build_forecast_url(
        &config.forecast.base_url,
        config.location.latitude,
        config.location.longitude,
    );
    debug!(%url, "requesting forecast");

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(FetchError::Http(response.status().as_u16()));
    }

    let text = response.text()?;
    parse_forecast_response(&text, range)
}

/// Fetch the forecast and convert it into observation-compatible records.
pub fn fetch_forecast_observations(
    client: &reqwest::blocking::Client,
    config: &Config,
    range: &QueryRange,
) -> Result<Vec<RawObservation>, FetchError> {
    let points = fetch_forecast(client, config, range)?;
    Ok(points
        .into_iter()
        .map(|p| p.into_observation(config.forecast.gust_factor))
        .collect())
}

/// Parse a Locationforecast JSON body, keeping steps inside `range`.
///
/// Steps without a wind speed or direction, or with an unparseable time, are
/// skipped. The result is sorted by time.
pub fn parse_forecast_response(json: &str, range: &QueryRange) -> Result<Vec<ForecastPoint>, FetchError> {
    let response: ForecastResponse =
        serde_json::from_str(json).map_err(|e| FetchError::Parse(e.to_string()))?;

    let mut points: Vec<ForecastPoint> = response
        .properties
        .timeseries
        .into_iter()
        .filter_map(parse_step)
        .filter(|p| range.contains(p.time))
        .collect();

    if points.is_empty() {
        return Err(FetchError::NoData(format!("forecast {}", range.cache_key())));
    }

    points.sort_by_key(|p| p.time);
    Ok(points)
}

fn parse_step(step: ForecastStep) -> Option<ForecastPoint> {
    let time = DateTime::parse_from_rfc3339(&step.time).ok()?.with_timezone(&Utc);
    let details = step.data.instant.details;

    Some(ForecastPoint {
        time,
        wind_speed: details.wind_speed.filter(|v| v.is_finite())?,
        wind_direction: details.wind_from_direction.filter(|v| v.is_finite())?,
        wind_gust: details.wind_speed_of_gust.filter(|v| v.is_finite()),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GustSource;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "type": "Feature",
        "properties": {
            "meta": { "updated_at": "2024-06-01T11:30:00Z" },
            "timeseries": [
                { "time": "2024-06-01T13:00:00Z",
                  "data": { "instant": { "details": { "wind_speed": 5.0, "wind_from_direction": 210.0 } } } },
                { "time": "2024-06-01T12:00:00Z",
                  "data": { "instant": { "details": { "wind_speed": 4.0, "wind_from_direction": 200.0, "wind_speed_of_gust": 7.5 } } } },
                { "time": "2024-06-01T14:00:00Z",
                  "data": { "instant": { "details": { "air_temperature": 18.2 } } } },
                { "time": "2024-06-03T12:00:00Z",
                  "data": { "instant": { "details": { "wind_speed": 9.0, "wind_from_direction": 10.0 } } } }
            ]
        }
    }"#;

    fn range() -> QueryRange {
        QueryRange::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_forecast_url() {
        let url = build_forecast_url("https://api.met.no/weatherapi/locationforecast/2.0/complete/", 59.912345, 10.7);
        assert_eq!(
            url,
            "https://api.met.no/weatherapi/locationforecast/2.0/complete?lat=59.9123&lon=10.7000"
        );
    }

    #[test]
    fn test_parse_keeps_in_range_wind_steps_sorted() {
        let points = parse_forecast_response(SAMPLE, &range()).expect("sample should parse");
        assert_eq!(points.len(), 2, "step without wind and out-of-range step are dropped");
        assert_eq!(points[0].time, Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        assert_eq!(points[0].wind_gust, Some(7.5));
        assert_eq!(points[1].wind_gust, None);
    }

    #[test]
    fn test_points_convert_with_tagged_gusts() {
        let points = parse_forecast_response(SAMPLE, &range()).unwrap();
        let obs: Vec<_> = points.into_iter().map(|p| p.into_observation(1.5)).collect();
        assert_eq!(obs[0].gust_source, GustSource::Measured);
        assert_eq!(obs[1].gust_source, GustSource::Estimated);
        assert_eq!(obs[1].wind_gust, 7.5);
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let result = parse_forecast_response("{\"properties\": {}}", &range());
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_no_points_in_range_is_no_data() {
        let far = QueryRange::new(
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap();
        assert!(matches!(parse_forecast_response(SAMPLE, &far), Err(FetchError::NoData(_))));
    }
}
