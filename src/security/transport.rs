//! HTTPS enforcement.
//!
//! Requests that did not reach us over TLS (directly, or through the single
//! trusted proxy) are redirected to the same URL on `https://` and never
//! reach a handler.

use axum::{
    body::Body,
    extract::State,
    http::{header::HOST, uri::Authority, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::RelayError;
use crate::observability::metrics;
use crate::security::client_ip::forwarded_https;

/// What the transport check needs to know about the deployment.
#[derive(Debug, Clone, Copy)]
pub struct TransportPolicy {
    /// Redirect insecure requests at all.
    pub enforce: bool,
    /// The listener terminates TLS itself.
    pub listener_tls: bool,
    pub trust_proxy_hops: u8,
}

impl TransportPolicy {
    fn is_secure<B>(&self, request: &Request<B>) -> bool {
        self.listener_tls
            || request.uri().scheme_str() == Some("https")
            || forwarded_https(request.headers(), self.trust_proxy_hops)
    }
}

/// `https://{host}{path?query}` for an insecure request.
pub fn https_location<B>(request: &Request<B>) -> Result<String, RelayError> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Authority>().ok())
        .ok_or(RelayError::MissingHost)?;
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Ok(format!("https://{}{}", host, path))
}

pub async fn enforce_https(
    State(policy): State<TransportPolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !policy.enforce || policy.is_secure(&request) {
        return next.run(request).await;
    }

    metrics::record_security_rejection("insecure_transport");
    match https_location(&request) {
        Ok(location) => {
            tracing::debug!(location = %location, "Redirecting to HTTPS");
            RelayError::InsecureTransport { location }.into_response()
        }
        Err(e) => e.into_response(),
    }
}
