use reqwest::StatusCode;
use thiserror::Error;

/// Outcome of a single provider lookup that did not produce data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no {what} found for '{query}'")]
    NotFound { what: &'static str, query: String },

    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("city name is empty")]
    Empty,

    #[error("city name may only contain letters and spaces")]
    InvalidCharacters,

    #[error("city name is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to the database")]
    Connect(#[source] sqlx::Error),

    #[error("database query failed")]
    Query(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum StationError {
    #[error("weather lookup failed")]
    Weather(#[source] FetchError),

    #[error("air quality lookup failed")]
    Pollution(#[source] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid city name")]
    Validation(#[from] ValidationError),
}
