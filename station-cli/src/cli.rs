use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use log::error;
use station_core::{
    Config, FileConfig, OpenWeatherClient, PostgresStorage, Station, Storage, WeatherRecord,
    config::DEFAULT_COUNTRY, validate::normalize_city_name,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "station",
    version,
    about = "Current weather and air quality for a city, recorded to Postgres",
    long_about = "Without a subcommand, asks for a city (or uses the configured default), \
                  stores the current reading and prints a summary."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch current readings for a city and store them.
    Save {
        city: String,

        /// Country code, e.g. "pl". Defaults to the configured country.
        #[arg(long)]
        country: Option<String>,
    },

    /// Print current readings for a city without storing them.
    Show {
        city: String,

        #[arg(long)]
        country: Option<String>,
    },

    /// List stored readings for a city, newest first.
    History {
        city: String,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Create the weather_data table if it does not exist.
    Init,

    /// Store the API key and default country in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Some(command) = self.command else {
            let config = Config::load()?;
            return interactive(&config).await;
        };

        match command {
            Command::Configure => configure(),
            Command::Init => {
                let config = Config::load()?;
                let storage = PostgresStorage::new(&config.database);
                match storage.ensure_schema().await {
                    Ok(()) => println!("Table weather_data is ready."),
                    Err(err) => report_failure(err),
                }
                Ok(())
            }
            Command::Save { city, country } => {
                let config = Config::load()?;
                let storage = PostgresStorage::new(&config.database);
                let client = OpenWeatherClient::from_config(&config);
                let country = country.unwrap_or_else(|| config.country.clone());
                let station = Station::new(normalize_city_name(&city), country, &client, &client);

                save(&station, &storage).await;
                Ok(())
            }
            Command::Show { city, country } => {
                let config = Config::load()?;
                let client = OpenWeatherClient::from_config(&config);
                let country = country.unwrap_or_else(|| config.country.clone());
                let station = Station::new(normalize_city_name(&city), country, &client, &client);

                if station.validate().is_err() {
                    println!("Invalid city name. Please try again.");
                    return Ok(());
                }
                station.display(&mut std::io::stdout()).await?;
                Ok(())
            }
            Command::History { city, limit } => {
                let config = Config::load()?;
                let storage = PostgresStorage::new(&config.database);
                history(&storage, &normalize_city_name(&city), limit).await;
                Ok(())
            }
        }
    }
}

async fn interactive(config: &Config) -> anyhow::Result<()> {
    let storage = PostgresStorage::new(&config.database);
    if let Err(err) = storage.ensure_schema().await {
        report_failure(err);
    }

    let raw = match &config.default_city {
        Some(city) => city.clone(),
        None => Text::new("Enter city name to check weather:")
            .prompt()
            .context("Failed to read city name")?,
    };

    let client = OpenWeatherClient::from_config(config);
    let station =
        Station::new(normalize_city_name(&raw), config.country.as_str(), &client, &client);

    save(&station, &storage).await;
    Ok(())
}

async fn save(station: &Station<'_>, storage: &dyn Storage) {
    if station.validate().is_err() {
        println!("Invalid city name. Please try again.");
        return;
    }

    match station.save(storage).await {
        Ok(report) => println!("{report}"),
        Err(err) => report_failure(err),
    }
}

async fn history(storage: &dyn Storage, city: &str, limit: u32) {
    let rows = match storage.recent(city, limit).await {
        Ok(rows) => rows,
        Err(err) => return report_failure(err),
    };

    if rows.is_empty() {
        println!("No readings stored for {city}.");
        return;
    }

    for row in &rows {
        println!("{}", format_row(row));
    }
}

/// One history line; NULL columns show as `-`.
fn format_row(row: &WeatherRecord) -> String {
    let created_at = row
        .created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let temperature = row.temperature.map(|t| format!("{t:.2}")).unwrap_or_else(|| "-".into());
    let humidity = row.humidity.map(|h| format!("{h:.1}")).unwrap_or_else(|| "-".into());

    format!(
        "{created_at:<19}  {temperature:>7} C  {humidity:>5}%  {}",
        row.pollution_level.as_deref().unwrap_or("-")
    )
}

fn configure() -> anyhow::Result<()> {
    let mut file = FileConfig::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let current_country = file.country.clone().unwrap_or_else(|| DEFAULT_COUNTRY.to_string());
    let country = Text::new("Default country code:")
        .with_default(&current_country)
        .prompt()
        .context("Failed to read country code")?;

    file.api_key = Some(api_key.trim().to_string());
    file.country = Some(country.trim().to_lowercase());

    let path = file.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn report_failure<E>(err: E)
where
    E: std::error::Error + Send + Sync + 'static,
{
    let err = anyhow::Error::from(err);
    error!("{err:#}");
    eprintln!("Error: {err:#}");
}
