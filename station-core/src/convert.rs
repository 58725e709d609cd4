//! Unit conversions applied to raw provider values.

const KELVIN_OFFSET: f64 = 273.15;

/// Kelvin to Celsius, rounded to two decimal places (half away from zero).
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    round2(kelvin - KELVIN_OFFSET)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Celsius for display: whole values keep one decimal (`27.0`), others
/// print as stored (`12.31`).
pub fn format_celsius(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
