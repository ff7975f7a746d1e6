//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → transport.rs (plain HTTP → 302 to https://)
//!     → rate_limit.rs (per-client fixed window, 429 past quota)
//!     → csrf.rs (token bound to session cookie, 403 on mismatch)
//!     → Pass to form validation
//!
//! Every response:
//!     → headers.rs (CSP, HSTS, frame/sniffing protections)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Forwarded headers are trusted only behind exactly one proxy hop
//! - No check ever reaches the mail provider

pub mod client_ip;
pub mod csrf;
pub mod headers;
pub mod rate_limit;
pub mod transport;

pub use csrf::{AntiForgery, CsrfRejection, SaltedTokens, SessionSecret};
pub use rate_limit::{Admission, RateLimitGate, RateLimiter};
pub use transport::TransportPolicy;
