//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define pipeline metrics (requests, latency, rejections, rate limiting)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `pipeline_requests_total` (counter): total requests by method, status
//! - `pipeline_request_duration_seconds` (histogram): latency distribution
//! - `pipeline_rejections_total` (counter): funnel renders by status, kind
//! - `pipeline_rate_limited_total` (counter): requests refused with 429
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, disabled config)
//! - Labels for method, status code and rejection kind only

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    counter!(
        "pipeline_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("pipeline_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_rejection(status: u16, kind: &'static str) {
    counter!(
        "pipeline_rejections_total",
        "status" => status.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_rate_limited() {
    counter!("pipeline_rate_limited_total").increment(1);
}
