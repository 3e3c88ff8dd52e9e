//! Wind strength rating.
//!
//! One category scale and one colour scale for every view, keyed on mean
//! wind speed in meters/second. Upper bounds are exclusive and roughly
//! follow Beaufort 0, 1-2, 3-4, 5, 6-7 and 8+.

use serde::Serialize;

/// Wind strength categories, in ascending order of strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindCategory {
    Calm,
    Light,
    Moderate,
    Fresh,
    Strong,
    Gale,
}

/// Exclusive upper bounds (m/s) for every category but `Gale`.
const CATEGORY_LIMITS: [(f64, WindCategory); 5] = [
    (1.0, WindCategory::Calm),
    (4.0, WindCategory::Light),
    (8.0, WindCategory::Moderate),
    (11.0, WindCategory::Fresh),
    (17.0, WindCategory::Strong),
];

impl WindCategory {
    /// Hex colour used for this category in charts and lists.
    pub fn color(self) -> &'static str {
        match self {
            WindCategory::Calm => "#d9f0f7",
            WindCategory::Light => "#8fd3e8",
            WindCategory::Moderate => "#3fa7d6",
            WindCategory::Fresh => "#f6c344",
            WindCategory::Strong => "#f08a24",
            WindCategory::Gale => "#d7263d",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WindCategory::Calm => "Calm",
            WindCategory::Light => "Light",
            WindCategory::Moderate => "Moderate",
            WindCategory::Fresh => "Fresh",
            WindCategory::Strong => "Strong",
            WindCategory::Gale => "Gale",
        }
    }
}

/// Rates a wind speed. Non-finite or negative speeds rate as `Calm`.
pub fn rate_wind_speed(speed_ms: f64) -> WindCategory {
    if !speed_ms.is_finite() {
        return WindCategory::Calm;
    }
    CATEGORY_LIMITS
        .iter()
        .find(|(limit, _)| speed_ms < *limit)
        .map(|(_, category)| *category)
        .unwrap_or(WindCategory::Gale)
}
