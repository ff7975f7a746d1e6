//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the form relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Outbound mail provider settings.
    pub mail: MailConfig,

    /// Transport, anti-forgery and header hardening.
    pub security: SecurityConfig,

    /// Per-client admission control.
    pub rate_limit: RateLimitConfig,

    /// Where successful submissions are sent afterwards.
    pub redirects: RedirectConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Optional TLS configuration. When set, every request arrives over HTTPS.
    pub tls: Option<TlsConfig>,

    /// Maximum requests served concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            tls: None,
            max_connections: 1_024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Microsoft Graph mail settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    /// Mailbox every submission is delivered to.
    pub destination: String,

    /// Mailbox the message is sent as. Defaults to `destination`.
    pub sender: Option<String>,

    /// Azure AD tenant.
    pub tenant_id: String,

    /// Application (client) id registered for Mail.Send.
    pub client_id: String,

    /// Client secret for the application.
    pub client_secret: String,

    /// Identity platform base URL.
    pub token_base_url: String,

    /// Graph API base URL.
    pub graph_base_url: String,

    /// Upper bound on a single provider call, in seconds.
    pub timeout_secs: u64,
}

impl MailConfig {
    /// Mailbox used in the `/users/{sender}/sendMail` path.
    pub fn sender_mailbox(&self) -> &str {
        self.sender.as_deref().unwrap_or(&self.destination)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            sender: None,
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            token_base_url: "https://login.microsoftonline.com".to_string(),
            graph_base_url: "https://graph.microsoft.com".to_string(),
            timeout_secs: 15,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("destination", &self.destination)
            .field("sender", &self.sender)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_base_url", &self.token_base_url)
            .field("graph_base_url", &self.graph_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Redirect plain HTTP requests to their HTTPS equivalent.
    pub enforce_https: bool,

    /// Number of reverse proxies in front of the relay (0 or 1).
    /// Forwarded headers are only honored when this is 1.
    pub trust_proxy_hops: u8,

    /// Add hardened security headers to every response.
    pub enable_headers: bool,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Name of the cookie carrying the anti-forgery session secret.
    pub csrf_cookie_name: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enforce_https: true,
            trust_proxy_hops: 1,
            enable_headers: true,
            max_body_size: 64 * 1024, // 64KB
            csrf_cookie_name: "_csrf".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per client in one window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Post-submission redirect targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Thank-you page for contact inquiries.
    pub contact_thank_you: String,

    /// Thank-you page for work applications.
    pub application_thank_you: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            contact_thank_you: "https://grants4you.org/thank-you-for-getting-in-touch-with-us.html"
                .to_string(),
            application_thank_you: "https://grants4you.org/thank-you-for-applying.html".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
