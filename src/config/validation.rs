//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics: required mail
//! credentials, parseable addresses, sane limits and proxy trust. All problems
//! are returned together so an operator can fix a config in one pass.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `mail.destination`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    let mail = &config.mail;
    let required = [
        ("mail.destination", &mail.destination),
        ("mail.tenant_id", &mail.tenant_id),
        ("mail.client_id", &mail.client_id),
        ("mail.client_secret", &mail.client_secret),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "is required"));
        }
    }
    if !mail.destination.is_empty() && !mail.destination.contains('@') {
        errors.push(ValidationError::new("mail.destination", "must be a mailbox address"));
    }
    for (field, value) in [
        ("mail.token_base_url", &mail.token_base_url),
        ("mail.graph_base_url", &mail.graph_base_url),
    ] {
        if Url::parse(value).is_err() {
            errors.push(ValidationError::new(field, format!("'{}' is not a URL", value)));
        }
    }
    if mail.timeout_secs == 0 {
        errors.push(ValidationError::new("mail.timeout_secs", "must be greater than 0"));
    }

    if config.security.trust_proxy_hops > 1 {
        errors.push(ValidationError::new(
            "security.trust_proxy_hops",
            "only 0 or 1 trusted proxy hops are supported",
        ));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    if config.security.csrf_cookie_name.is_empty()
        || !config
            .security
            .csrf_cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new(
            "security.csrf_cookie_name",
            "must be a non-empty cookie token",
        ));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
    }

    for (field, value) in [
        ("redirects.contact_thank_you", &config.redirects.contact_thank_you),
        ("redirects.application_thank_you", &config.redirects.application_thank_you),
    ] {
        match Url::parse(value) {
            Ok(url) if url.scheme() == "https" => {}
            _ => errors.push(ValidationError::new(field, "must be an absolute https URL")),
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
