//! Unified error types for the status service and client.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::config::Environment;
use crate::report::ErrorResponse;

/// Unified error type for startup and the binary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    /// Metrics exporter installation error.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// In-flight requests did not drain in time after a termination signal.
    #[error("shutdown grace period of {0:?} elapsed")]
    ShutdownTimeout(std::time::Duration),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced to HTTP callers as an [`ErrorResponse`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// No route matched.
    #[error("Endpoint {method} {path} not found")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// A handler failed or panicked.
    #[error("{message}")]
    Internal {
        /// Message shown to the caller (already redacted outside development).
        message: String,
        /// Error chain or panic payload, development only.
        stack: Option<String>,
    },
}

/// Message returned for handler faults outside development.
pub const REDACTED_MESSAGE: &str = "Something went wrong";

impl ApiError {
    /// Convert a handler error into a 500, redacting it outside development.
    pub fn internal(err: &(dyn std::error::Error + 'static), env: Environment) -> Self {
        let chain = error_chain(err);
        error!("Error: {}", chain);
        Self::fault(err.to_string(), chain, env)
    }

    /// Build a 500 from a message and its detail (error chain or panic payload).
    pub fn fault(message: String, detail: String, env: Environment) -> Self {
        if env.exposes_internals() {
            Self::Internal {
                message,
                stack: Some(detail),
            }
        } else {
            Self::Internal {
                message: REDACTED_MESSAGE.to_string(),
                stack: None,
            }
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::NotFound { .. } => ErrorResponse::not_found(self.to_string()),
            ApiError::Internal { message, stack } => {
                ErrorResponse::internal(message.clone(), stack.clone())
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Render an error and all of its sources, outermost first.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Failures of a single client fetch cycle.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Server answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Connection, timeout or transport failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Body was not a valid health report.
    #[error("invalid response body: {0}")]
    Parse(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
