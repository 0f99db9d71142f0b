//! JSON payloads served by the status API.
//!
//! Everything here is built at request time and dropped after serialization.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::Environment;
use crate::vitals::{MemoryStats, ProcessSnapshot};

/// Service name reported by `/api/status`.
pub const SERVICE_NAME: &str = "merge-guard-demo-backend";

/// Features advertised by `/api/status`, in display order.
pub const FEATURES: &[&str] = &[
    "GitHub Safe Merge & Deploy Workflow",
    "Merge state validation",
    "Automated releases",
    "Health monitoring",
];

/// Routes listed in 404 responses.
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /api/status",
    "GET /api/info",
];

const APPLICATION: &str = "GitHub Safe Merge & Deploy Workflow Demo";
const DESCRIPTION: &str =
    "A production-ready GitHub project demonstrating secure PR merge and deployment workflows";
const REPOSITORY: &str = "https://github.com/your-org/dev-workflow-poc";
const DOCUMENTATION: &str = "/docs";
const WELCOME: &str = "GitHub Safe Merge & Deploy Workflow - Backend API";

/// Version and mode shared by all payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// Reported version.
    pub version: String,
    /// Runtime mode.
    pub environment: Environment,
}

/// Logical name to path.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EndpointMap {
    /// Health route.
    pub health: &'static str,
    /// Status route.
    pub status: &'static str,
    /// Info route.
    pub info: &'static str,
}

/// The three informational routes.
pub const ENDPOINTS: EndpointMap = EndpointMap {
    health: "/health",
    status: "/api/status",
    info: "/api/info",
};

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always "ok" from this service.
    pub status: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Service version.
    pub version: String,
    /// Runtime mode.
    pub environment: String,
    /// Uptime in seconds.
    pub uptime: f64,
    /// Memory counters in bytes.
    pub memory: MemoryStats,
    /// Process id.
    pub pid: u32,
}

impl HealthReport {
    /// Build from a vitals snapshot.
    pub fn from_snapshot(identity: &ServiceIdentity, snapshot: ProcessSnapshot) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: snapshot.timestamp_ms,
            version: identity.version.clone(),
            environment: identity.environment.to_string(),
            uptime: snapshot.uptime_seconds,
            memory: snapshot.memory,
            pid: snapshot.pid,
        }
    }
}

/// `GET /api/status` body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Service name.
    pub name: &'static str,
    /// Service version.
    pub version: String,
    /// Runtime mode.
    pub environment: Environment,
    /// RFC 3339 time of the response.
    pub timestamp: String,
    /// Route map.
    pub endpoints: EndpointMap,
    /// Advertised features.
    pub features: &'static [&'static str],
}

impl StatusReport {
    /// Build the report stamped with `now`.
    pub fn at(identity: &ServiceIdentity, now: OffsetDateTime) -> Result<Self, time::error::Format> {
        Ok(Self {
            name: SERVICE_NAME,
            version: identity.version.clone(),
            environment: identity.environment,
            timestamp: now.format(&Rfc3339)?,
            endpoints: ENDPOINTS,
            features: FEATURES,
        })
    }
}

/// `GET /api/info` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoReport {
    pub application: &'static str,
    pub description: &'static str,
    pub repository: &'static str,
    pub documentation: &'static str,
    pub version: String,
    /// Compiler the binary was built with.
    pub runtime_version: &'static str,
    pub platform: &'static str,
    pub architecture: &'static str,
}

impl InfoReport {
    pub fn new(identity: &ServiceIdentity) -> Self {
        Self {
            application: APPLICATION,
            description: DESCRIPTION,
            repository: REPOSITORY,
            documentation: DOCUMENTATION,
            version: identity.version.clone(),
            runtime_version: env!("BUILD_RUSTC_VERSION"),
            platform: std::env::consts::OS,
            architecture: std::env::consts::ARCH,
        }
    }
}

/// `GET /` body.
#[derive(Debug, Clone, Serialize)]
pub struct WelcomeReport {
    pub message: &'static str,
    pub version: String,
    pub endpoints: EndpointMap,
}

impl WelcomeReport {
    pub fn new(identity: &ServiceIdentity) -> Self {
        Self {
            message: WELCOME,
            version: identity.version.clone(),
            endpoints: ENDPOINTS,
        }
    }
}

/// Uniform body for 404 and 500 responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Short category, e.g. "Not Found".
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Development-only detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Valid routes, on 404 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<&'static [&'static str]>,
    /// RFC 3339 time of the response.
    pub timestamp: String,
}

impl ErrorResponse {
    /// 404 body listing the valid routes.
    pub fn not_found(message: String) -> Self {
        Self {
            error: "Not Found",
            message,
            stack: None,
            available_endpoints: Some(AVAILABLE_ENDPOINTS),
            timestamp: rfc3339_now(),
        }
    }

    /// 500 body; callers decide whether `stack` is exposed.
    pub fn internal(message: String, stack: Option<String>) -> Self {
        Self {
            error: "Internal Server Error",
            message,
            stack,
            available_endpoints: None,
            timestamp: rfc3339_now(),
        }
    }
}

fn rfc3339_now() -> String {
    // Formatting the current UTC time cannot fail for any realistic clock.
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
