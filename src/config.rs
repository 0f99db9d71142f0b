//! Application configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

/// Runtime mode, controls error verbosity and log format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Verbose errors with stack, human-readable logs.
    #[default]
    Development,
    /// Redacted errors, JSON logs.
    Production,
}

impl Environment {
    /// Whether error responses may carry internal messages and stacks.
    pub fn exposes_internals(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Development or production.
    #[serde(default)]
    pub app_env: Environment,

    /// Version reported in payloads; falls back to the crate version.
    #[serde(default)]
    pub app_version: Option<String>,

    /// Single origin allowed by CORS.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Seconds to wait for in-flight requests after a termination signal.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Prometheus exporter port (disabled when unset).
    #[serde(default)]
    pub metrics_port: Option<u16>,

    // === Client Configuration ===
    /// Base URL of the status API polled by `watch`.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Seconds between health fetches.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout for the client.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    3001
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_shutdown_grace() -> u64 {
    10
}

fn default_api_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_http_timeout() -> u64 {
    10_000
}

/// Filter used by `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "merge_guard_demo=debug,tower_http=debug,info";

fn default_log_level() -> String {
    "info".to_string()
}

/// `<base>/health`, keeping any path prefix of `base`.
pub fn health_url_for(base: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let prefixed = format!("{}/", url.path());
        url.set_path(&prefixed);
    }
    url.join("health")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            app_env: Environment::default(),
            app_version: None,
            frontend_url: default_frontend_url(),
            shutdown_grace_secs: default_shutdown_grace(),
            metrics_port: None,
            api_url: default_api_url(),
            poll_interval_secs: default_poll_interval(),
            http_timeout_ms: default_http_timeout(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        self.bind_addr()?;

        self.cors_origin()
            .map_err(|_| format!("FRONTEND_URL is not a valid origin: {}", self.frontend_url))?;

        let api = self
            .health_url()
            .map_err(|e| format!("API_URL is invalid: {}", e))?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err("API_URL must use http or https".to_string());
        }

        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be at least 1".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Version reported by every payload.
    pub fn version(&self) -> String {
        self.app_version
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    /// Socket address the service binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| format!("HOST/PORT do not form a socket address: {}:{}", self.host, self.port))
    }

    /// Allowed CORS origin as a header value.
    pub fn cors_origin(&self) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        HeaderValue::from_str(self.frontend_url.trim_end_matches('/'))
    }

    /// Full URL of the health endpoint the client polls.
    pub fn health_url(&self) -> Result<Url, url::ParseError> {
        health_url_for(&self.api_url)
    }

    /// Polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Client request timeout as a duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Shutdown drain bound as a duration.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Log filter directive: `RUST_LOG`, or crate-level debug when verbose.
    pub fn log_filter(&self, verbose: bool) -> String {
        if verbose {
            VERBOSE_LOG_FILTER.to_string()
        } else if self.rust_log.trim().is_empty() {
            default_log_level()
        } else {
            self.rust_log.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        assert_eq!(default_port(), 3001);
        assert_eq!(default_api_url(), "http://localhost:3001");
        assert_eq!(default_poll_interval(), 30);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn version_falls_back_to_crate_version() {
        let mut config = Config::default();
        assert_eq!(config.version(), env!("CARGO_PKG_VERSION"));

        config.app_version = Some("2.3.4".to_string());
        assert_eq!(config.version(), "2.3.4");

        config.app_version = Some(String::new());
        assert_eq!(config.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn health_url_is_joined_to_base() {
        let config = Config {
            api_url: "http://status.internal:8080/".to_string(),
            ..Config::default()
        };

        assert_eq!(
            config.health_url().unwrap().as_str(),
            "http://status.internal:8080/health"
        );
    }

    #[test]
    fn health_url_keeps_base_path_prefix() {
        let config = Config {
            api_url: "http://proxy.local/backend".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.health_url().unwrap().as_str(),
            "http://proxy.local/backend/health"
        );

        assert_eq!(
            health_url_for("http://proxy.local/backend/").unwrap().as_str(),
            "http://proxy.local/backend/health"
        );
        assert_eq!(
            health_url_for("http://localhost:3001").unwrap().as_str(),
            "http://localhost:3001/health"
        );
    }

    #[test]
    fn log_filter_follows_rust_log() {
        let mut config = Config::default();
        assert_eq!(config.log_filter(false), "info");

        config.rust_log = "merge_guard_demo=trace,warn".to_string();
        assert_eq!(config.log_filter(false), "merge_guard_demo=trace,warn");
        assert_eq!(config.log_filter(true), VERBOSE_LOG_FILTER);

        config.rust_log = "  ".to_string();
        assert_eq!(config.log_filter(false), "info");
    }

    #[test]
    fn validate_rejects_non_http_api_url() {
        let config = Config {
            api_url: "ftp://localhost:3001".to_string(),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_bind_host() {
        let config = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_parses_lowercase() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(Environment::Development.to_string(), "development");
        assert!(Environment::Development.exposes_internals());
        assert!(!Environment::Production.exposes_internals());
    }
}
