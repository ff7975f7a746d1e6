//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, request IDs in spans)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout log collection
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Field values from submissions are never logged
//! - Request ID flows through every span
//! - Metrics exporter is disabled by default

pub mod logging;
pub mod metrics;
