//! Metrics collection and exposition.
//!
//! # Metrics
//! - `correlation_requests_total` (counter): resolutions by `source`
//!   (`upstream` when the caller supplied an id, `generated` otherwise)
//! - `correlation_config_reloads_total` (counter): reloads by `outcome`
//!
//! Without an installed recorder these calls are no-ops.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one correlation resolution.
pub fn record_resolution(generated: bool) {
    let source = if generated { "generated" } else { "upstream" };
    metrics::counter!("correlation_requests_total", "source" => source).increment(1);
}

/// Count a configuration reload attempt.
pub fn record_reload(applied: bool) {
    let outcome = if applied { "applied" } else { "rejected" };
    metrics::counter!("correlation_config_reloads_total", "outcome" => outcome).increment(1);
}
