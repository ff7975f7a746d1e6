//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (request id, tracing, metrics, headers, limits)
//!     → security gate (transport redirect, rate limit)
//!     → extract.rs (JSON or URL-encoded body into loose fields)
//!     → handlers.rs (anti-forgery, body shape, validation, delivery, redirect)
//!     → error.rs (every rejection mapped to one response shape)
//!     → Send to client
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::RelayError;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, AppState, RelayServer};
