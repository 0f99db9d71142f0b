//! Request logging, CORS and the handler fault boundary.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::ResponseForPanic;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use crate::config::Environment;
use crate::error::ApiError;
use crate::metrics;

/// Log method, path, status and duration of every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;
    metrics::record_http_request(start, method.as_str(), status);

    if status >= 500 {
        warn!(%method, %path, status, duration_ms, "{} {} - {} - {}ms", method, path, status, duration_ms);
    } else {
        info!(%method, %path, status, duration_ms, "{} {} - {} - {}ms", method, path, status, duration_ms);
    }

    response
}

/// CORS restricted to one origin, GET only, credentials allowed.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET])
        .allow_credentials(true)
}

/// Turns a handler panic into a 500 [`ErrorResponse`](crate::report::ErrorResponse).
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    env: Environment,
}

impl PanicResponder {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = panic_message(err.as_ref());
        error!("Error: handler panicked: {}", message);

        let detail = format!("panicked: {}", message);
        ApiError::fault(message, detail, self.env).into_response()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}
