//! Outbound mail subsystem.
//!
//! # Data Flow
//! ```text
//! SanitizedSubmission
//!     → message.rs (subject + HTML body from fixed templates)
//!     → DeliveryAdapter::deliver (one attempt, timing, logging)
//!     → Mailer (graph.rs in production, fakes in tests)
//! ```
//!
//! # Design Decisions
//! - Exactly one send attempt per submission, never retried
//! - Provider errors are recorded here and surface to clients only as a 500
//! - The destination mailbox is fixed per deployment

pub mod graph;
pub mod message;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

use crate::forms::SanitizedSubmission;
use crate::observability::metrics;

pub use graph::GraphMailer;
pub use message::{compose, OutboundEmail};

/// Errors from the mail provider.
#[derive(Debug, Error)]
pub enum MailError {
    /// Network or protocol failure talking to the provider.
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The identity platform refused to issue an access token.
    #[error("token request rejected with status {status}: {detail}")]
    TokenRejected { status: u16, detail: String },

    /// The provider refused the message.
    #[error("message rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// A configured endpoint could not be turned into a URL.
    #[error("invalid mail endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("mail provider unavailable: {0}")]
    Unavailable(String),
}

/// Something that can send one email.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_email(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Turns sanitized submissions into a single provider call.
#[derive(Clone)]
pub struct DeliveryAdapter {
    mailer: Arc<dyn Mailer>,
    destination: String,
}

impl DeliveryAdapter {
    pub fn new(mailer: Arc<dyn Mailer>, destination: impl Into<String>) -> Self {
        Self {
            mailer,
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Compose and send. Either the provider accepted the whole message or
    /// the error is returned; nothing is retried.
    pub async fn deliver(&self, submission: &SanitizedSubmission) -> Result<(), MailError> {
        let email = compose(submission, &self.destination);
        let kind = submission.kind();
        let start = Instant::now();

        let result = self.mailer.send_email(&email).await;
        metrics::record_delivery(kind, result.is_ok(), start);

        match &result {
            Ok(()) => tracing::info!(
                kind = %kind,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Submission delivered"
            ),
            Err(e) => tracing::error!(kind = %kind, error = %e, "Submission delivery failed"),
        }
        result
    }
}
