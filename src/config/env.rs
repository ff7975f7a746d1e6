//! Environment overrides.
//!
//! Secrets and deployment-specific values usually arrive through the
//! environment rather than the config file. Overrides are applied after the
//! file is parsed and before validation runs.

use crate::config::schema::GatewayConfig;

/// Port to listen on; replaces the port of `listener.bind_address`.
pub const PORT: &str = "PORT";
/// Destination mailbox.
pub const EMAIL: &str = "EMAIL";
/// Mailbox the relay sends as.
pub const SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const TENANT_ID: &str = "TENANT_ID";
pub const CLIENT_ID: &str = "CLIENT_ID";
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";

/// Apply overrides from the process environment.
pub fn apply_process_env(config: &mut GatewayConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup. Empty values are ignored.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get(PORT) {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port.trim());
    }
    if let Some(email) = get(EMAIL) {
        config.mail.destination = email;
    }
    if let Some(sender) = get(SENDER_EMAIL) {
        config.mail.sender = Some(sender);
    }
    if let Some(tenant) = get(TENANT_ID) {
        config.mail.tenant_id = tenant;
    }
    if let Some(client_id) = get(CLIENT_ID) {
        config.mail.client_id = client_id;
    }
    if let Some(secret) = get(CLIENT_SECRET) {
        config.mail.client_secret = secret;
    }
}
