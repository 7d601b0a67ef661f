//! Metrics collection and exposition.
//!
//! # Metrics
//! - `replay_requests_total` (counter): requests by method and outcome
//! - `replay_request_duration_seconds` (histogram): handler latency
//! - `archive_loads_total` (counter): load attempts by result
//! - `archive_entries` / `archive_keys` (gauges): size of the active archive
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    counter!("replay_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("replay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_archive_load(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("archive_loads_total", "result" => result).increment(1);
}

pub fn set_archive_size(entries: usize, keys: usize) {
    gauge!("archive_entries").set(entries as f64);
    gauge!("archive_keys").set(keys as f64);
}
