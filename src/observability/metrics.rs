//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome (forwarded, short_circuit, rejected)
//! - `gateway_request_duration_seconds` (histogram): time spent in the gateway
//! - `gateway_short_circuits_total` (counter): replies by stage
//! - `gateway_sessions_recovered_total` (counter): remember-me re-registrations
//! - `gateway_decrypt_failures_total` (counter): undecryptable login payloads
//! - `gateway_captchas_issued_total` (counter): codes handed out
//! - `gateway_logins_total` (counter): logins recorded from upstream
//! - `gateway_sessions_evicted_total` (counter): idle sessions dropped
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Labels are static strings to keep cardinality bounded

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("gateway_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_short_circuit(stage: &'static str) {
    counter!("gateway_short_circuits_total", "stage" => stage).increment(1);
}

pub fn record_session_recovered() {
    counter!("gateway_sessions_recovered_total").increment(1);
}

pub fn record_decrypt_failure() {
    counter!("gateway_decrypt_failures_total").increment(1);
}

pub fn record_captcha_issued() {
    counter!("gateway_captchas_issued_total").increment(1);
}

pub fn record_login() {
    counter!("gateway_logins_total").increment(1);
}

pub fn record_sessions_evicted(count: usize) {
    counter!("gateway_sessions_evicted_total").increment(count as u64);
}
