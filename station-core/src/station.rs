use log::warn;
use serde::Serialize;
use std::{fmt, io};

use crate::{
    convert::format_celsius,
    error::StationError,
    model::{PollutionLevel, WeatherReading},
    provider::{PollutionSource, WeatherSource},
    storage::Storage,
    validate::validate_city_name,
};

/// A (city, country) pair queried through a weather and a pollution source.
/// Holds no state between calls.
#[derive(Debug)]
pub struct Station<'a> {
    city: String,
    country: String,
    weather: &'a dyn WeatherSource,
    pollution: &'a dyn PollutionSource,
}

/// Both readings for one city, fetched together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub city: String,
    pub reading: WeatherReading,
    pub level: PollutionLevel,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature in {} is {} Celsius. Air quality is {}.",
            self.city,
            format_celsius(self.reading.temperature_c),
            self.level.label().to_lowercase()
        )
    }
}

impl<'a> Station<'a> {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        weather: &'a dyn WeatherSource,
        pollution: &'a dyn PollutionSource,
    ) -> Self {
        Self { city: city.into(), country: country.into(), weather, pollution }
    }

    /// Advisory check of the city name; see [`crate::validate`].
    pub fn validate(&self) -> Result<(), StationError> {
        validate_city_name(&self.city).map_err(|err| {
            warn!("rejected city name {:?}: {err}", self.city);
            StationError::Validation(err)
        })
    }

    /// Fetch weather and pollution. Both lookups are always attempted so
    /// that each failure gets logged; the first one is returned.
    pub async fn report(&self) -> Result<Report, StationError> {
        let weather = self.weather.fetch_weather(&self.city, &self.country).await;
        if let Err(err) = &weather {
            warn!("weather lookup for {},{} failed: {err}", self.city, self.country);
        }

        let pollution = self.pollution.fetch_pollution(&self.city, &self.country).await;
        if let Err(err) = &pollution {
            warn!("air quality lookup for {},{} failed: {err}", self.city, self.country);
        }

        Ok(Report {
            city: self.city.clone(),
            reading: weather.map_err(StationError::Weather)?,
            level: pollution.map_err(StationError::Pollution)?,
        })
    }

    /// Fetch both readings and append exactly one row. Nothing is written
    /// unless both lookups succeed.
    pub async fn save(&self, storage: &dyn Storage) -> Result<Report, StationError> {
        let report = self.report().await?;
        storage.insert(&report.city, &report.reading, report.level).await?;
        Ok(report)
    }

    /// Write the one-line summary, or a diagnostic when a lookup failed.
    pub async fn display<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        match self.report().await {
            Ok(report) => writeln!(out, "{report}"),
            Err(err) => writeln!(
                out,
                "Could not get weather data for {}: {:#}",
                self.city,
                anyhow::Error::from(err)
            ),
        }
    }
}
