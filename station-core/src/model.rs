use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current conditions for a city, already converted to Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Textual air-quality bucket derived from the provider's 1..=5 AQI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollutionLevel {
    Excellent,
    Good,
    LightlyPolluted,
    ModeratelyPolluted,
    HeavilyPolluted,
    Unknown,
}

impl PollutionLevel {
    /// Total over all integers; anything outside 1..=5 is `Unknown`.
    pub fn from_aqi(aqi: i64) -> Self {
        match aqi {
            1 => PollutionLevel::Excellent,
            2 => PollutionLevel::Good,
            3 => PollutionLevel::LightlyPolluted,
            4 => PollutionLevel::ModeratelyPolluted,
            5 => PollutionLevel::HeavilyPolluted,
            _ => PollutionLevel::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollutionLevel::Excellent => "Excellent",
            PollutionLevel::Good => "Good",
            PollutionLevel::LightlyPolluted => "Lightly polluted",
            PollutionLevel::ModeratelyPolluted => "Moderately polluted",
            PollutionLevel::HeavilyPolluted => "Heavily polluted",
            PollutionLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PollutionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the `weather_data` table. Every column but `id` is nullable in
/// the schema, and tables written by older tools may hold NULLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeatherRecord {
    pub id: i32,
    pub city: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pollution_level: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}
