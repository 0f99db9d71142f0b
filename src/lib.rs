//! Status API and polling client for the GitHub Safe Merge & Deploy Workflow demo.
//!
//! The service answers a handful of unauthenticated GET routes with JSON
//! describing the running process. The client polls `/health` and keeps a
//! three-state view model (loading, error, success) for a renderer.
//!
//! ```text
//! GET /             welcome message and route map
//! GET /health       pid, uptime, memory, version, environment
//! GET /api/status   service name, routes, features
//! GET /api/info     static metadata
//! anything else     404 with the list above
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`vitals`]: Process vitals behind an injectable trait
//! - [`report`]: JSON payloads
//! - [`api`]: HTTP routes, middleware and serving
//! - [`client`]: Polling client and view model
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod utils;
pub mod vitals;

pub use config::{Config, Environment};
pub use error::{AppError, Result};
