//! Viewer configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Viewer configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerConfig {
    /// Authority server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Station name lookup configuration
    #[serde(default)]
    pub stations: StationsConfig,
}

impl ViewerConfig {
    /// Load configuration from file. A missing file yields the defaults so
    /// the viewer runs without any setup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: ViewerConfig = toml::from_str(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// The effective authority URL: `AUTH_SERVER_URL` overrides the file.
    pub fn server_url(&self) -> String {
        std::env::var("AUTH_SERVER_URL").unwrap_or_else(|_| self.server.url.clone())
    }
}

/// Authority server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the authentication authority
    #[serde(default = "default_server_url")]
    pub url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout: f64,

    /// Default card exchange timeout in seconds
    #[serde(default = "default_exchange_timeout")]
    pub exchange_timeout: f64,
}

impl ServerConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.http_timeout)
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.exchange_timeout)
    }
}

fn default_server_url() -> String {
    "https://felica-auth.nyaa.ws".to_string()
}

fn default_http_timeout() -> f64 {
    10.0
}

fn default_exchange_timeout() -> f64 {
    1.0
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            http_timeout: default_http_timeout(),
            exchange_timeout: default_exchange_timeout(),
        }
    }
}

/// Station name lookup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StationsConfig {
    /// Path to the station code table
    #[serde(default = "default_stations_path")]
    pub path: String,
}

fn default_stations_path() -> String {
    "station_codes.csv".to_string()
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            path: default_stations_path(),
        }
    }
}
