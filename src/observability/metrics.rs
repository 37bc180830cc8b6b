//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_proxy_requests_total` (counter): proxy responses by status and cache outcome
//! - `relay_proxy_request_duration_seconds` (histogram): proxy latency
//! - `relay_fetch_errors_total` (counter): failed upstream fetches by kind
//! - `relay_cache_entries` (gauge): live cache entries
//! - `relay_cache_evictions_total` (counter): evictions by reason
//! - `relay_rewrite_fallbacks_total` (counter): payloads served unmodified after a rewrite failure
//! - `relay_session_events_total` (counter): pairing lifecycle events
//! - `relay_active_sessions` (gauge): live pairing sessions
//!
//! Recording is a no-op until a recorder is installed, so tests never need one.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_proxy_request(status: u16, cache: &'static str, start: Instant) {
    metrics::counter!(
        "relay_proxy_requests_total",
        "status" => status.to_string(),
        "cache" => cache
    )
    .increment(1);
    metrics::histogram!("relay_proxy_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_fetch_error(kind: &'static str) {
    metrics::counter!("relay_fetch_errors_total", "kind" => kind).increment(1);
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("relay_cache_entries").set(entries as f64);
}

pub fn record_cache_eviction(reason: &'static str, count: usize) {
    metrics::counter!("relay_cache_evictions_total", "reason" => reason).increment(count as u64);
}

pub fn record_rewrite_fallback(kind: &'static str) {
    metrics::counter!("relay_rewrite_fallbacks_total", "kind" => kind).increment(1);
}

pub fn record_session_event(event: &'static str) {
    metrics::counter!("relay_session_events_total", "event" => event).increment(1);
}

pub fn record_active_sessions(count: usize) {
    metrics::gauge!("relay_active_sessions").set(count as f64);
}
