//! Metrics collection and exposition.
//!
//! # Metrics
//! - `marquee_requests_total` (counter): requests by method, status
//! - `marquee_request_duration_seconds` (histogram): latency by method
//! - `marquee_rate_limited_total` (counter): 429s from the limiter
//! - `marquee_auth_failures_total` (counter): rejected credentials by reason
//! - `marquee_panics_total` (counter): faults caught by panic isolation
//! - `marquee_limiter_clients` (gauge): clients currently tracked
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - The Prometheus exporter serves its own listener, off the API port

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "marquee_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("marquee_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("marquee_rate_limited_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("marquee_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_panic() {
    counter!("marquee_panics_total").increment(1);
}

pub fn record_limiter_clients(count: usize) {
    gauge!("marquee_limiter_clients").set(count as f64);
}
