//! Metrics collection and exposition.
//!
//! # Metrics
//! - `form_relay_requests_total` (counter): requests by method, status
//! - `form_relay_request_duration_seconds` (histogram): end-to-end latency
//! - `form_relay_submissions_total` (counter): submissions by kind, outcome
//! - `form_relay_security_rejections_total` (counter): gate rejections by reason
//! - `form_relay_mail_delivery_duration_seconds` (histogram): provider latency
//!
//! Recording is a no-op until a recorder is installed, so handlers and
//! tests call these unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::forms::SubmissionKind;

/// Outcome label for `form_relay_submissions_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Invalid,
    DeliveryFailed,
}

impl SubmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Invalid => "invalid",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "form_relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("form_relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_submission(kind: SubmissionKind, outcome: SubmissionOutcome) {
    counter!(
        "form_relay_submissions_total",
        "kind" => kind.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_security_rejection(reason: &'static str) {
    counter!("form_relay_security_rejections_total", "reason" => reason).increment(1);
}

pub fn record_delivery(kind: SubmissionKind, success: bool, start: Instant) {
    histogram!(
        "form_relay_mail_delivery_duration_seconds",
        "kind" => kind.as_str(),
        "success" => if success { "true" } else { "false" }
    )
    .record(start.elapsed().as_secs_f64());
}

/// Middleware recording method, status and latency of every request.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_owned();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
