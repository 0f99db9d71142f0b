//! Integration tests: a real listener served by the API router, polled by the real client.
//!
//! Run with: cargo test --test integration

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use merge_guard_demo::api::{create_router, serve_until, AppState};
use merge_guard_demo::client::{Poller, StatusClient, View};
use merge_guard_demo::config::Config;
use merge_guard_demo::error::ClientError;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A running server and the means to stop it.
struct TestServer {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<merge_guard_demo::Result<()>>,
}

impl TestServer {
    async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(serve_until(
            listener,
            router,
            async move {
                let _ = stopped.await;
            },
            Duration::from_secs(5),
        ));

        Self {
            addr,
            stop: Some(stop),
            task,
        }
    }

    async fn status_api() -> Self {
        let config = Config::default();
        let state = AppState::from_config(&config).unwrap();
        Self::start(create_router(state)).await
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let result = (&mut self.task).await.unwrap();
        assert!(result.is_ok(), "server did not shut down cleanly: {:?}", result.err());
    }
}

fn client_for(server: &TestServer) -> StatusClient {
    StatusClient::with_base_url(&server.base_url(), Duration::from_secs(2)).unwrap()
}

/// The live /health endpoint reports this very process.
#[tokio::test]
async fn test_client_reads_live_health() {
    let server = TestServer::status_api().await;
    let client = client_for(&server);

    let report = client.fetch_health().await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.pid, std::process::id());
    assert_eq!(report.environment, "development");
    assert!(report.uptime >= 0.0);

    server.shutdown().await;
}

/// Unknown routes answer 404 over a real socket.
#[tokio::test]
async fn test_unknown_route_over_http() {
    let server = TestServer::status_api().await;

    let response = reqwest::get(format!("{}/nonexistent", server.base_url()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["availableEndpoints"].as_array().unwrap().len(), 4);

    server.shutdown().await;
}

/// A non-2xx response becomes the banner text.
#[tokio::test]
async fn test_non_success_status_is_reported() {
    let router = Router::new().route("/health", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let server = TestServer::start(router).await;

    let result = client_for(&server).fetch_health().await;
    match result {
        Err(e @ ClientError::Status(503)) => assert_eq!(e.to_string(), "HTTP error! status: 503"),
        other => panic!("expected status error, got {:?}", other),
    }

    server.shutdown().await;
}

/// A body that is not a health report is a parse error.
#[tokio::test]
async fn test_malformed_body_is_a_parse_error() {
    let router = Router::new().route("/health", get(|| async { "definitely not json" }));
    let server = TestServer::start(router).await;

    let result = client_for(&server).fetch_health().await;
    assert!(matches!(result, Err(ClientError::Parse(_))), "{:?}", result);

    server.shutdown().await;
}

/// The poller against a live server reaches the ready view.
#[tokio::test]
async fn test_poller_renders_live_report() {
    let server = TestServer::status_api().await;
    let handle = Poller::new(Arc::new(client_for(&server)), Duration::from_secs(30)).start();
    let mut rx = handle.subscribe();

    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.report.is_some()))
        .await
        .expect("no report within 5s")
        .unwrap()
        .clone();

    assert!(matches!(state.view(), View::Ready(r) if r.pid == std::process::id()));

    handle.stop().await;
    server.shutdown().await;
}

/// With nothing listening, the poller settles on the error view with no report.
#[tokio::test]
async fn test_poller_reports_unreachable_backend() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let client = StatusClient::with_base_url(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let handle = Poller::new(Arc::new(client), Duration::from_secs(30)).start();
    let mut rx = handle.subscribe();

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| !s.loading && s.error.is_some()),
    )
    .await
    .expect("no error within 5s")
    .unwrap()
    .clone();

    assert!(matches!(state.view(), View::Error(_)));
    assert!(state.report.is_none());

    handle.stop().await;
}
