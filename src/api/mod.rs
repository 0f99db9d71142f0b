//! HTTP API module for health, status and info endpoints.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::serve_until;
