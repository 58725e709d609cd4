use async_trait::async_trait;
use log::{debug, info, warn};
use sqlx::{Connection, PgConnection, postgres::PgConnectOptions};
use std::fmt::Debug;

use crate::{
    config::DatabaseConfig,
    error::StorageError,
    model::{PollutionLevel, WeatherReading, WeatherRecord},
};

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS weather_data (
    id SERIAL PRIMARY KEY,
    city VARCHAR(255),
    temperature FLOAT,
    humidity FLOAT,
    pollution_level VARCHAR(50),
    created_at TIMESTAMP
)";

const INSERT_ROW: &str = "\
INSERT INTO weather_data (city, temperature, humidity, pollution_level, created_at)
VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)";

const SELECT_RECENT: &str = "\
SELECT id, city, temperature, humidity, pollution_level, created_at
FROM weather_data
WHERE city = $1
ORDER BY created_at DESC NULLS LAST, id DESC
LIMIT $2";

/// Append-only store of weather readings.
#[async_trait]
pub trait Storage: Send + Sync + Debug {
    /// Create the table if it is missing. Safe to call on every start.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Append one row stamped with the current time.
    async fn insert(
        &self,
        city: &str,
        reading: &WeatherReading,
        level: PollutionLevel,
    ) -> Result<(), StorageError>;

    /// Newest rows for `city`, newest first.
    async fn recent(&self, city: &str, limit: u32) -> Result<Vec<WeatherRecord>, StorageError>;
}

/// Postgres-backed storage. Every call opens its own connection and closes
/// it before returning, on success and on failure alike.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    options: PgConnectOptions,
}

impl PostgresStorage {
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.name);

        if let Some(password) = &config.password {
            options = options.password(password);
        }

        Self { options }
    }

    async fn connect(&self) -> Result<PgConnection, StorageError> {
        PgConnection::connect_with(&self.options).await.map_err(StorageError::Connect)
    }
}

async fn release(conn: PgConnection) {
    if let Err(err) = conn.close().await {
        warn!("failed to close database connection cleanly: {err}");
    }
}

async fn create_table(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    let mut tx = conn.begin().await?;
    sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
    tx.commit().await
}

async fn insert_row(
    conn: &mut PgConnection,
    city: &str,
    reading: &WeatherReading,
    level: PollutionLevel,
) -> Result<(), sqlx::Error> {
    let mut tx = conn.begin().await?;
    sqlx::query(INSERT_ROW)
        .bind(city)
        .bind(reading.temperature_c)
        .bind(reading.humidity_pct)
        .bind(level.label())
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        let result = create_table(&mut conn).await;
        release(conn).await;

        result.map_err(StorageError::Query)?;
        debug!("weather_data table is in place");
        Ok(())
    }

    async fn insert(
        &self,
        city: &str,
        reading: &WeatherReading,
        level: PollutionLevel,
    ) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        let result = insert_row(&mut conn, city, reading, level).await;
        release(conn).await;

        result.map_err(StorageError::Query)?;
        info!(
            "stored {city}: {} C, {}% humidity, {level}",
            reading.temperature_c, reading.humidity_pct
        );
        Ok(())
    }

    async fn recent(&self, city: &str, limit: u32) -> Result<Vec<WeatherRecord>, StorageError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_as::<_, WeatherRecord>(SELECT_RECENT)
            .bind(city)
            .bind(i64::from(limit))
            .fetch_all(&mut conn)
            .await;
        release(conn).await;

        result.map_err(StorageError::Query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_bind_every_value() {
        assert!(!INSERT_ROW.contains('\''));
        for placeholder in ["$1", "$2", "$3", "$4"] {
            assert!(INSERT_ROW.contains(placeholder));
        }
        assert!(INSERT_ROW.contains("CURRENT_TIMESTAMP"));
        assert!(SELECT_RECENT.contains("$1") && SELECT_RECENT.contains("$2"));
    }

    #[test]
    fn schema_creation_is_idempotent_sql() {
        assert!(CREATE_TABLE.starts_with("CREATE TABLE IF NOT EXISTS weather_data"));
    }

    #[tokio::test]
    async fn unreachable_database_is_a_connect_error() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            // nothing listens on the discard port
            port: 9,
            ..DatabaseConfig::default()
        };
        let storage = PostgresStorage::new(&config);

        let err = storage.ensure_schema().await.unwrap_err();

        assert!(matches!(err, StorageError::Connect(_)));
    }
}
