//! HTTP API route definitions.

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health, info, not_found, root, status, AppState};
use super::middleware::{cors_layer, log_requests, PanicResponder};
use crate::config::Environment;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let env = state.environment();
    let origin = state.cors_origin.clone();

    // Non-GET methods on known paths fall through to 404 like unknown paths.
    let router = Router::new().route("/", get(root).fallback(not_found));
    let router = route_with_trailing_slash(router, "/health", get(health).fallback(not_found));
    let router = route_with_trailing_slash(router, "/api/status", get(status).fallback(not_found));
    let router = route_with_trailing_slash(router, "/api/info", get(info).fallback(not_found));
    let router = router.fallback(not_found).with_state(state);

    with_service_layers(router, env, origin)
}

/// Serve `path` and `path/` with the same handler.
fn route_with_trailing_slash(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

/// Wrap a router with the fault boundary, request log, CORS and security headers.
pub(crate) fn with_service_layers(router: Router, env: Environment, origin: HeaderValue) -> Router {
    router
        .layer(CatchPanicLayer::custom(PanicResponder::new(env)))
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origin))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ))
}
