//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirector_requests_total` (counter): requests seen by the not-found hook, by outcome
//! - `redirector_redirects_total` (counter): issued redirects, by status
//! - `redirector_resolve_duration_seconds` (histogram): rule lookup + URL synthesis time
//! - `redirector_rules` (gauge): rules in the active rule set
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Labels are low-cardinality: never the URI

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// What the not-found hook did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The application answered with something other than 404.
    Passthrough,
    /// A rule matched and a redirect was sent.
    Redirected,
    /// No rule matched; the original 404 was kept.
    Unmatched,
    /// A rule matched but built an unusable `Location`; the original 404 was kept.
    Invalid,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Passthrough => "passthrough",
            Outcome::Redirected => "redirected",
            Outcome::Unmatched => "unmatched",
            Outcome::Invalid => "invalid",
        }
    }
}

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_outcome(outcome: Outcome) {
    metrics::counter!("redirector_requests_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_redirect(status: u16, started: Instant) {
    metrics::counter!("redirector_redirects_total", "status" => status.to_string()).increment(1);
    record_resolve_duration(started);
}

pub fn record_resolve_duration(started: Instant) {
    metrics::histogram!("redirector_resolve_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

pub fn set_rule_count(count: usize) {
    metrics::gauge!("redirector_rules").set(count as f64);
}
