//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_upstream_attempts_total` (counter): attempts by backend, status
//! - `gateway_failovers_total` (counter): failed attempts that triggered
//!   failover, by backend
//! - `gateway_auth_rejected_total` (counter): admission rejections by reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(error) => tracing::error!(%error, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_attempt(backend: &str, status: u16) {
    metrics::counter!(
        "gateway_upstream_attempts_total",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_failover(backend: &str) {
    metrics::counter!("gateway_failovers_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_auth_rejected(reason: &'static str) {
    metrics::counter!("gateway_auth_rejected_total", "reason" => reason).increment(1);
}
