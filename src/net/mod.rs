//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain listener (TLS terminated by the fronting proxy), or
//!     → tls.rs (rustls handshake when `listener.tls` is configured)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional; behind a proxy the scheme comes from `X-Forwarded-Proto`
//! - Certificate files are checked up front so startup fails with a clear path

pub mod tls;

pub use tls::load_tls_config;
