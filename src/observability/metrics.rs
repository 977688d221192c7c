//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by `outcome`
//! - `relay_upstream_duration_seconds` (histogram): outbound fetch latency
//! - `relay_rate_limit_clients` (gauge): clients tracked after a sweep
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "relay_requests_total";
pub const UPSTREAM_DURATION: &str = "relay_upstream_duration_seconds";
pub const RATE_LIMIT_CLIENTS: &str = "relay_rate_limit_clients";

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_outcome(outcome: &'static str) {
    ::metrics::counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_upstream_duration(start: Instant) {
    ::metrics::histogram!(UPSTREAM_DURATION).record(start.elapsed().as_secs_f64());
}

pub fn set_tracked_clients(count: usize) {
    ::metrics::gauge!(RATE_LIMIT_CLIENTS).set(count as f64);
}
