//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, Method, Uri},
    Json,
};
use time::OffsetDateTime;

use crate::config::{Config, Environment};
use crate::error::{ApiError, AppError};
use crate::report::{HealthReport, InfoReport, ServiceIdentity, StatusReport, WelcomeReport};
use crate::vitals::{SystemVitals, VitalsSource};

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Version and mode reported by every payload.
    pub identity: Arc<ServiceIdentity>,
    /// Where `/health` reads process vitals from.
    pub vitals: Arc<dyn VitalsSource>,
    /// The one origin CORS allows.
    pub cors_origin: HeaderValue,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        identity: ServiceIdentity,
        vitals: Arc<dyn VitalsSource>,
        cors_origin: HeaderValue,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            vitals,
            cors_origin,
        }
    }

    /// State for the live process, reading vitals from the OS.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let cors_origin = config
            .cors_origin()
            .map_err(|e| AppError::InvalidConfig(format!("FRONTEND_URL: {}", e)))?;

        Ok(Self::new(
            ServiceIdentity {
                version: config.version(),
                environment: config.app_env,
            },
            Arc::new(SystemVitals::new()),
            cors_origin,
        ))
    }

    /// Runtime mode.
    pub fn environment(&self) -> Environment {
        self.identity.environment
    }
}

/// Health check handler - always returns 200 while the process is alive.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let snapshot = state.vitals.snapshot();
    Json(HealthReport::from_snapshot(&state.identity, snapshot))
}

/// Status handler - static identity stamped with the current time.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusReport>, ApiError> {
    StatusReport::at(&state.identity, OffsetDateTime::now_utc())
        .map(Json)
        .map_err(|e| ApiError::internal(&e, state.environment()))
}

/// Info handler - static descriptive metadata.
pub async fn info(State(state): State<AppState>) -> Json<InfoReport> {
    Json(InfoReport::new(&state.identity))
}

/// Root handler - welcome message and route map.
pub async fn root(State(state): State<AppState>) -> Json<WelcomeReport> {
    Json(WelcomeReport::new(&state.identity))
}

/// Fallback for anything that is not a known GET route.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        method,
        path: uri.path().to_string(),
    }
}
