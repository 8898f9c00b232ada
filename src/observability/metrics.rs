//! Metrics collection and exposition.
//!
//! # Metrics
//! - `filter_decisions_total` (counter): decisions by outcome and reason

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one filter decision.
pub fn record_decision(outcome: &'static str, reason: &'static str) {
    ::metrics::counter!("filter_decisions_total", "outcome" => outcome, "reason" => reason)
        .increment(1);
}
