use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    config::Config,
    convert::kelvin_to_celsius,
    error::FetchError,
    model::{Coordinates, WeatherReading},
};

use super::{PollutionSource, WeatherSource};

const WEATHER: &str = "OpenWeather current weather";
const GEOCODE: &str = "OpenWeather geocoding";
const AIR_POLLUTION: &str = "OpenWeather air pollution";

/// Client for the free OpenWeather endpoints: current weather, direct
/// geocoding and air pollution.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Self {
        Self::with_http(api_key, base_url, Client::new())
    }

    /// Reuse a preconfigured `reqwest::Client` (timeouts, proxy settings).
    pub fn with_http(api_key: String, base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { api_key, base_url, http }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_key.clone(), config.base_url.as_str())
    }

    async fn get(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Transport { endpoint, source })?;

        Ok((status, body))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch_weather(&self, city: &str, country: &str) -> Result<WeatherReading, FetchError> {
        let q = location_query(city, country);
        let (status, body) = self
            .get(WEATHER, "/data/2.5/weather", &[("q", q.as_str()), ("APPID", self.api_key.as_str())])
            .await?;

        parse_weather(&q, status, &body)
    }
}

#[async_trait]
impl PollutionSource for OpenWeatherClient {
    async fn geocode(&self, city: &str, country: &str) -> Result<Coordinates, FetchError> {
        let q = location_query(city, country);
        let (status, body) = self
            .get(
                GEOCODE,
                "/geo/1.0/direct",
                &[("q", q.as_str()), ("limit", "1"), ("appid", self.api_key.as_str())],
            )
            .await?;

        parse_geocode(&q, status, &body)
    }

    async fn air_quality_index(&self, coords: Coordinates) -> Result<i64, FetchError> {
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();
        let (status, body) = self
            .get(
                AIR_POLLUTION,
                "/data/2.5/air_pollution",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", self.api_key.as_str())],
            )
            .await?;

        parse_air_quality(&format!("{lat},{lon}"), status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeatherResponse {
    main: OwMain,
}

/// Only `cod` is read from an error body; it is a string on errors and a
/// number on success.
#[derive(Debug, Deserialize)]
struct OwStatus {
    cod: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwAqiMain {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAqiMain,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    list: Vec<OwAirEntry>,
}

pub fn parse_weather(query: &str, status: StatusCode, body: &str) -> Result<WeatherReading, FetchError> {
    check_status(WEATHER, "city", query, status, body)?;

    let parsed: OwWeatherResponse = serde_json::from_str(body)
        .map_err(|source| FetchError::Decode { endpoint: WEATHER, source })?;

    Ok(WeatherReading {
        temperature_c: kelvin_to_celsius(parsed.main.temp),
        humidity_pct: parsed.main.humidity,
    })
}

pub fn parse_geocode(query: &str, status: StatusCode, body: &str) -> Result<Coordinates, FetchError> {
    check_status(GEOCODE, "location", query, status, body)?;

    let entries: Vec<OwGeocodeEntry> = serde_json::from_str(body)
        .map_err(|source| FetchError::Decode { endpoint: GEOCODE, source })?;

    entries
        .first()
        .map(|e| Coordinates { lat: e.lat, lon: e.lon })
        .ok_or_else(|| not_found("location", query))
}

/// AQI of the first (current hour) entry; later entries are ignored.
pub fn parse_air_quality(query: &str, status: StatusCode, body: &str) -> Result<i64, FetchError> {
    check_status(AIR_POLLUTION, "air quality data", query, status, body)?;

    let parsed: OwAirResponse = serde_json::from_str(body)
        .map_err(|source| FetchError::Decode { endpoint: AIR_POLLUTION, source })?;

    parsed
        .list
        .first()
        .map(|entry| entry.main.aqi)
        .ok_or_else(|| not_found("air quality data", query))
}

fn check_status(
    endpoint: &'static str,
    what: &'static str,
    query: &str,
    status: StatusCode,
    body: &str,
) -> Result<(), FetchError> {
    if status == StatusCode::NOT_FOUND || body_signals_not_found(body) {
        return Err(not_found(what, query));
    }

    if !status.is_success() {
        return Err(FetchError::Status { endpoint, status, body: truncate_body(body) });
    }

    Ok(())
}

fn body_signals_not_found(body: &str) -> bool {
    let Ok(OwStatus { cod: Some(cod) }) = serde_json::from_str::<OwStatus>(body) else {
        return false;
    };

    match cod {
        serde_json::Value::String(s) => s == "404",
        serde_json::Value::Number(n) => n.as_i64() == Some(404),
        _ => false,
    }
}

fn not_found(what: &'static str, query: &str) -> FetchError {
    FetchError::NotFound { what, query: query.to_string() }
}

fn location_query(city: &str, country: &str) -> String {
    format!("{city},{country}")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_converts_temp_and_keeps_humidity() {
        let body = r#"{
            "coord": {"lon": 17.03, "lat": 51.1},
            "main": {"temp": 300.15, "feels_like": 301.0, "pressure": 1012, "humidity": 40},
            "name": "Wroclaw",
            "cod": 200
        }"#;

        let reading = parse_weather("Wroclaw,pl", StatusCode::OK, body).expect("valid payload");

        assert_eq!(reading, WeatherReading { temperature_c: 27.0, humidity_pct: 40.0 });
    }

    #[test]
    fn freezing_point_is_a_valid_reading() {
        let body = r#"{"main": {"temp": 273.15, "humidity": 0}}"#;

        let reading = parse_weather("Oymyakon,ru", StatusCode::OK, body).expect("valid payload");

        assert_eq!(reading.temperature_c, 0.0);
        assert_eq!(reading.humidity_pct, 0.0);
    }

    #[test]
    fn weather_not_found_by_status_or_cod() {
        let body = r#"{"cod": "404", "message": "city not found"}"#;

        assert!(parse_weather("Nowhere,pl", StatusCode::NOT_FOUND, body).unwrap_err().is_not_found());
        assert!(parse_weather("Nowhere,pl", StatusCode::OK, body).unwrap_err().is_not_found());
    }

    #[test]
    fn weather_server_error_is_status_error() {
        let body = r#"{"cod": 401, "message": "Invalid API key"}"#;

        let err = parse_weather("Wroclaw,pl", StatusCode::UNAUTHORIZED, body).unwrap_err();

        match err {
            FetchError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn weather_garbage_is_decode_error() {
        let err = parse_weather("Wroclaw,pl", StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn geocode_takes_first_match() {
        let body = r#"[
            {"name": "Wrocław", "lat": 51.1, "lon": 17.03, "country": "PL"},
            {"name": "Wrocław", "lat": 0.0, "lon": 0.0, "country": "PL"}
        ]"#;

        let coords = parse_geocode("Wrocław,pl", StatusCode::OK, body).expect("valid payload");

        assert_eq!(coords, Coordinates { lat: 51.1, lon: 17.03 });
    }

    #[test]
    fn geocode_empty_list_is_not_found() {
        let err = parse_geocode("Atlantis,pl", StatusCode::OK, "[]").unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("Atlantis,pl"));
    }

    #[test]
    fn air_quality_uses_first_entry_only() {
        let body = r#"{
            "coord": {"lon": 17.03, "lat": 51.1},
            "list": [
                {"main": {"aqi": 2}, "components": {"co": 201.94}, "dt": 1605182400},
                {"main": {"aqi": 5}, "components": {"co": 300.0}, "dt": 1605186000}
            ]
        }"#;

        assert_eq!(parse_air_quality("51.1,17.03", StatusCode::OK, body).expect("valid payload"), 2);
    }

    #[test]
    fn air_quality_empty_list_is_not_found() {
        let err = parse_air_quality("0,0", StatusCode::OK, r#"{"list": []}"#).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "ł".repeat(300);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = OpenWeatherClient::new("KEY".into(), "http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
