//! Test doubles shared by the unit test modules.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::{
    error::StorageError,
    model::{PollutionLevel, WeatherReading, WeatherRecord},
    storage::Storage,
};

/// Stand-in for the `weather_data` table.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    rows: Mutex<Vec<WeatherRecord>>,
    fail: bool,
}

impl MemoryStorage {
    /// Every insert fails with a query error.
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn rows(&self) -> Vec<WeatherRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn insert(
        &self,
        city: &str,
        reading: &WeatherReading,
        level: PollutionLevel,
    ) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Query(sqlx::Error::PoolClosed));
        }
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i32 + 1;
        rows.push(WeatherRecord {
            id,
            city: Some(city.to_string()),
            temperature: Some(reading.temperature_c),
            humidity: Some(reading.humidity_pct),
            pollution_level: Some(level.label().to_string()),
            created_at: Some(Utc::now().naive_utc()),
        });
        Ok(())
    }

    async fn recent(&self, city: &str, limit: u32) -> Result<Vec<WeatherRecord>, StorageError> {
        Ok(self
            .rows()
            .into_iter()
            .rev()
            .filter(|row| row.city.as_deref() == Some(city))
            .take(limit as usize)
            .collect())
    }
}

/// HTTP/1.1 server on a random local port answering each request by path
/// with a fixed status and JSON body. Unknown paths get a 404.
#[derive(Debug)]
pub struct CannedServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    pub async fn start(routes: Vec<(&'static str, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = Arc::clone(&seen);
                let routes = Arc::clone(&routes);
                tokio::spawn(async move { answer(stream, &routes, &seen).await });
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines received so far, e.g. `GET /geo/1.0/direct?q=... HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn answer(
    mut stream: TcpStream,
    routes: &[(&'static str, u16, String)],
    seen: &Mutex<Vec<String>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next().unwrap_or_default().to_string();
    let target = request_line.split_whitespace().nth(1).unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default();

    let (status, body) = routes
        .iter()
        .find(|(route, _, _)| *route == path)
        .map(|(_, status, body)| (*status, body.clone()))
        .unwrap_or((404, r#"{"cod":"404","message":"not found"}"#.to_string()));

    seen.lock().unwrap().push(request_line);

    let response = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
