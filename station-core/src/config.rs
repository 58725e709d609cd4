use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_COUNTRY: &str = "pl";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Connection parameters for the Postgres storage writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            name: "postgres".to_string(),
        }
    }
}

/// What may be stored in `config.toml`. Every field is optional; the
/// environment fills in or overrides values.
///
/// Example TOML:
/// api_key = "..."
/// country = "pl"
///
/// [database]
/// host = "localhost"
/// name = "weather"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub database: FileDatabaseConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl FileConfig {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-station", "station")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Resolved settings, built once at startup and handed to the clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub country: String,
    pub default_city: Option<String>,
    pub base_url: String,
    pub database: DatabaseConfig,
}

impl Config {
    /// Config file overlaid with the process environment.
    pub fn load() -> Result<Self> {
        let file = FileConfig::load()?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a file layer with an environment lookup; the environment wins.
    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = env("API_KEY").or(file.api_key).ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: set API_KEY (e.g. in .env) or run `station configure`."
            )
        })?;

        let defaults = DatabaseConfig::default();
        let port = match env("DB_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("DB_PORT must be a port number, got '{raw}'"))?,
            None => file.database.port.unwrap_or(defaults.port),
        };

        let database = DatabaseConfig {
            host: env("DB_HOST").or(file.database.host).unwrap_or(defaults.host),
            port,
            user: env("DB_USER").or(file.database.user).unwrap_or(defaults.user),
            password: env("DB_PASSWORD").or(file.database.password),
            name: env("DB_NAME").or(file.database.name).unwrap_or(defaults.name),
        };

        Ok(Self {
            api_key,
            country: env("STATION_COUNTRY")
                .or(file.country)
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            default_city: env("STATION_CITY").or(file.city),
            base_url: env("OPENWEATHER_BASE_URL")
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database,
        })
    }
}
