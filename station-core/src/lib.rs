//! Core library for the `station` CLI.
//!
//! This crate defines:
//! - Configuration loaded once at startup (file + environment)
//! - Weather and air-quality lookups against OpenWeather
//! - City-name validation and unit conversion
//! - Append-only storage of readings in Postgres
//!
//! It is used by `station-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod provider;
pub mod station;
pub mod storage;
pub mod validate;

#[cfg(test)]
mod testing;

pub use config::{Config, DatabaseConfig, FileConfig};
pub use error::{FetchError, StationError, StorageError, ValidationError};
pub use model::{Coordinates, PollutionLevel, WeatherReading, WeatherRecord};
pub use provider::{PollutionSource, WeatherSource, openweather::OpenWeatherClient};
pub use station::{Report, Station};
pub use storage::{PostgresStorage, Storage};
