//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dev_proxy_requests_total` (counter): proxied requests by rule, status
//! - `dev_proxy_request_duration_seconds` (histogram): time to response head
//! - `dev_proxy_upstream_errors_total` (counter): failures by rule, kind
//!
//! Recording is a no-op until a recorder is installed, so the proxy pays
//! nothing when the exporter is disabled.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed proxied exchange.
pub fn record_exchange(rule: &str, status: u16, start: Instant) {
    metrics::counter!(
        "dev_proxy_requests_total",
        "rule" => rule.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("dev_proxy_request_duration_seconds", "rule" => rule.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed upstream exchange.
pub fn record_upstream_error(rule: &str, kind: &'static str) {
    metrics::counter!(
        "dev_proxy_upstream_errors_total",
        "rule" => rule.to_string(),
        "kind" => kind
    )
    .increment(1);
}
