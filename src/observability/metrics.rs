//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frontdoor_requests_total` (counter): requests by listener and decision
//! - `frontdoor_upstream_errors_total` (counter): transport failures to backends
//! - `frontdoor_upstream_duration_seconds` (histogram): time to backend response head
//! - `frontdoor_reloads_total` (counter): reloads by outcome
//! - `frontdoor_routing_hosts` (gauge): host keys in the current snapshot

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);

    if let Err(e) = builder.install() {
        tracing::error!("Failed to install Prometheus recorder: {}", e);
    } else {
        tracing::info!(address = %addr, "Metrics server listening");
    }
}

pub fn record_decision(listener: &'static str, decision: &'static str) {
    counter!("frontdoor_requests_total", "listener" => listener, "decision" => decision).increment(1);
}

pub fn record_upstream(start: Instant, failed: bool) {
    histogram!("frontdoor_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
    if failed {
        counter!("frontdoor_upstream_errors_total").increment(1);
    }
}

pub fn record_reload(success: bool) {
    let outcome = if success { "ok" } else { "failed" };
    counter!("frontdoor_reloads_total", "outcome" => outcome).increment(1);
}

pub fn set_routing_hosts(hosts: usize) {
    gauge!("frontdoor_routing_hosts").set(hosts as f64);
}
