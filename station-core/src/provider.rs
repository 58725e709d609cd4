use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;

use crate::{
    error::FetchError,
    model::{Coordinates, PollutionLevel, WeatherReading},
};

pub mod openweather;

/// Current temperature and humidity for a city.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_weather(&self, city: &str, country: &str) -> Result<WeatherReading, FetchError>;
}

/// Air quality for a city, resolved in two steps: geocode, then look up
/// the index at the resulting coordinates.
#[async_trait]
pub trait PollutionSource: Send + Sync + Debug {
    /// Best match for the city; `NotFound` when the provider knows no such place.
    async fn geocode(&self, city: &str, country: &str) -> Result<Coordinates, FetchError>;

    /// Raw AQI of the current hour at `coords`.
    async fn air_quality_index(&self, coords: Coordinates) -> Result<i64, FetchError>;

    async fn fetch_pollution(&self, city: &str, country: &str) -> Result<PollutionLevel, FetchError> {
        let coords = self.geocode(city, country).await?;
        debug!("{city},{country} resolved to ({}, {})", coords.lat, coords.lon);

        let aqi = self.air_quality_index(coords).await?;
        Ok(PollutionLevel::from_aqi(aqi))
    }
}
