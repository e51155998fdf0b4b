//! Prometheus metrics for proxy observability.
//!
//! Metrics are exposed on a dedicated listener when `METRICS_PORT` is set.
//! Without an installed recorder every recording function is a no-op, so
//! handlers and tests can call them unconditionally.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `viewstats_proxy_requests_total` - Proxy requests by outcome
//!   (`success`, `upstream_status`, `upstream_error`, `bad_request`, `rate_limited`)
//! - `viewstats_proxy_upstream_status_total` - Upstream responses by status code
//!
//! ## Histograms
//! - `viewstats_proxy_upstream_duration_seconds` - Upstream call duration (label: status)

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "viewstats_proxy_requests_total";
    pub const UPSTREAM_STATUS_TOTAL: &str = "viewstats_proxy_upstream_status_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "viewstats_proxy_upstream_duration_seconds";
}

/// Outcome labels for [`names::REQUESTS_TOTAL`].
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const UPSTREAM_STATUS: &str = "upstream_status";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const BAD_REQUEST: &str = "bad_request";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Initialize the Prometheus metrics exporter.
///
/// Starts the Prometheus HTTP listener on `metrics_addr` and registers
/// metric descriptions.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::REQUESTS_TOTAL,
        "Total number of proxy requests by outcome"
    );
    describe_counter!(
        names::UPSTREAM_STATUS_TOTAL,
        "Total number of upstream responses by HTTP status"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream request duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record the outcome of a proxy request.
pub fn record_request(outcome: &'static str) {
    counter!(names::REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record an upstream response status.
pub fn record_upstream_status(status: u16) {
    counter!(names::UPSTREAM_STATUS_TOTAL, "status" => status.to_string()).increment(1);
}

/// Record upstream call duration. `status` is the HTTP status or `"error"`.
pub fn record_upstream_duration(status: &str, duration_secs: f64) {
    histogram!(names::UPSTREAM_DURATION_SECONDS, "status" => status.to_string())
        .record(duration_secs);
}
