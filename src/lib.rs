//! Form submission relay library.

pub mod config;
pub mod forms;
pub mod http;
pub mod lifecycle;
pub mod mail;
pub mod net;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
