//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bff_requests_total` (counter): picture requests by response status
//! - `bff_request_duration_seconds` (histogram): time until headers were sent
//! - `bff_upstream_calls_total` (counter): upstream calls by service and outcome
//! - `bff_relayed_bytes_total` (counter): picture bytes written to clients
//! - `bff_relay_failures_total` (counter): streams aborted mid-body
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::picture::RelaySummary;
use crate::upstream::Service;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    counter!("bff_requests_total", "status" => status.to_string()).increment(1);
    histogram!("bff_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_call(service: Service, outcome: &'static str) {
    counter!(
        "bff_upstream_calls_total",
        "service" => service.name(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_relay(summary: &RelaySummary) {
    counter!("bff_relayed_bytes_total").increment(summary.bytes);
}

pub fn record_relay_failure() {
    counter!("bff_relay_failures_total").increment(1);
}
