//! HTTP client for the status API.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument};
use url::Url;

use crate::config::{health_url_for, Config};
use crate::error::{AppError, ClientError};
use crate::report::HealthReport;

/// Anything that can produce a health report, one call per fetch cycle.
pub trait HealthFetcher: Send + Sync + 'static {
    /// Fetch the current report.
    fn fetch(&self) -> impl Future<Output = Result<HealthReport, ClientError>> + Send;
}

/// reqwest-backed client for `GET /health`.
#[derive(Debug, Clone)]
pub struct StatusClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Absolute URL of the health route.
    health_url: Url,
}

impl StatusClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::with_base_url(&config.api_url, config.http_timeout())
    }

    /// Create a client for an explicit base URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            http,
            health_url: health_url_for(base_url)?,
        })
    }

    /// URL polled by this client.
    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    /// Fetch and decode the health report.
    #[instrument(skip(self), fields(url = %self.health_url))]
    pub async fn fetch_health(&self) -> Result<HealthReport, ClientError> {
        let response = self.http.get(self.health_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let report: HealthReport = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        debug!(pid = report.pid, uptime = report.uptime, "Health report received");
        Ok(report)
    }
}

impl HealthFetcher for StatusClient {
    fn fetch(&self) -> impl Future<Output = Result<HealthReport, ClientError>> + Send {
        self.fetch_health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_is_appended_to_base_path() {
        let client =
            StatusClient::with_base_url("http://localhost:3001/app/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.health_url().as_str(), "http://localhost:3001/app/health");

        let client =
            StatusClient::with_base_url("http://proxy.local/backend", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.health_url().as_str(), "http://proxy.local/backend/health");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = StatusClient::with_base_url("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::Url(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client =
            StatusClient::with_base_url(&format!("http://{}", addr), Duration::from_millis(500))
                .unwrap();
        let result = client.fetch_health().await;
        assert!(matches!(result, Err(ClientError::Network(_))));
    }
}
