//! Prometheus metrics for the status API and the polling client.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::AppError;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Handler faults counter metric name.
pub const METRIC_HANDLER_FAULTS: &str = "handler_faults_total";
/// Client fetch latency metric name.
pub const METRIC_FETCH_LATENCY: &str = "health_fetch_latency_ms";
/// Client fetch failures counter metric name.
pub const METRIC_FETCH_FAILURES: &str = "health_fetch_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of HTTP requests served"
    );
    describe_counter!(
        METRIC_HANDLER_FAULTS,
        "Total number of requests answered with 500"
    );
    describe_histogram!(
        METRIC_FETCH_LATENCY,
        "Client health fetch latency in milliseconds"
    );
    describe_counter!(
        METRIC_FETCH_FAILURES,
        "Total number of failed client health fetches"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter on its own listener.
pub fn install_exporter(addr: SocketAddr) -> Result<(), AppError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::Metrics(e.to_string()))?;

    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

/// Record one served request.
pub fn record_http_request(start: Instant, method: &str, status: u16) {
    let latency_ms = elapsed_ms(start);
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "method" => method.to_string()).record(latency_ms);
    counter!(METRIC_HTTP_REQUESTS, "status" => status.to_string()).increment(1);
    if status >= 500 {
        counter!(METRIC_HANDLER_FAULTS).increment(1);
    }
}

/// Record one client fetch cycle.
pub fn record_fetch(start: Instant, ok: bool) {
    let latency_ms = elapsed_ms(start);
    histogram!(METRIC_FETCH_LATENCY).record(latency_ms);
    if !ok {
        counter!(METRIC_FETCH_FAILURES).increment(1);
    }
}

/// Elapsed milliseconds since `start`.
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn elapsed_ms_measures_time() {
        let start = Instant::now();
        sleep(Duration::from_millis(10));
        assert!(elapsed_ms(start) >= 9.0); // Allow some tolerance
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        init_metrics();
        record_http_request(Instant::now(), "GET", 500);
        record_fetch(Instant::now(), false);
    }
}
