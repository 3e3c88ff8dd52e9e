//! Wind direction helpers.
//!
//! Degree values wrap at 360, so directions are averaged as unit vectors and
//! every result is folded back into [0, 360). Views should use these helpers
//! rather than carrying their own compass or arrow arithmetic.

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Folds any finite angle into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    ((degrees % 360.0) + 360.0) % 360.0
}

/// Direction of the mean unit vector given its summed components.
///
/// `sum_sin` and `sum_cos` may be raw sums or means; only their ratio matters.
pub fn direction_from_components(sum_sin: f64, sum_cos: f64) -> f64 {
    normalize_degrees(sum_sin.atan2(sum_cos).to_degrees())
}

/// Circular mean of a set of directions in degrees.
///
/// Returns `None` for an empty input or when the directions cancel out
/// exactly (e.g. 0° and 180°), where no mean direction exists.
pub fn circular_mean<I>(angles: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (mut sum_sin, mut sum_cos, mut count) = (0.0_f64, 0.0_f64, 0usize);
    for angle in angles {
        let rad = angle.to_radians();
        sum_sin += rad.sin();
        sum_cos += rad.cos();
        count += 1;
    }
    if count == 0 {
        return None;
    }

    let n = count as f64;
    let resultant = ((sum_sin / n).powi(2) + (sum_cos / n).powi(2)).sqrt();
    if resultant < 1e-9 {
        return None;
    }
    Some(direction_from_components(sum_sin / n, sum_cos / n))
}

/// 16-point compass label for a direction ("N", "NNE", ... "NNW").
pub fn compass_point(degrees: f64) -> &'static str {
    let sector = (normalize_degrees(degrees) / 22.5).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[sector]
}

/// Rotation for an arrow glyph pointing where the wind is blowing *to*.
pub fn arrow_rotation(degrees: f64) -> f64 {
    normalize_degrees(degrees + 180.0)
}
