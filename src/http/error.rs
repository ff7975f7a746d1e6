//! Request-level errors and their HTTP mapping.
//!
//! Every rejection a client can see is produced here, so status codes and
//! bodies stay consistent across middleware and handlers. Internal details
//! are logged, never returned.

use axum::{
    http::{
        header::{LOCATION, RETRY_AFTER},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::forms::FieldError;
use crate::mail::MailError;
use crate::security::CsrfRejection;

pub const RATE_LIMITED_BODY: &str = "Too many requests, please try again later.";
pub const CSRF_REJECTED_BODY: &str = "invalid csrf token";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("submission failed validation ({} fields)", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("insecure transport, redirecting to {location}")]
    InsecureTransport { location: String },

    #[error("request has no usable Host header")]
    MissingHost,

    #[error("anti-forgery check failed: {0}")]
    Csrf(#[from] CsrfRejection),

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("malformed request body: {detail}")]
    MalformedBody { status: StatusCode, detail: String },

    #[error("delivery failed: {0}")]
    Delivery(#[from] MailError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    errors: &'a [FieldError],
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationBody { errors: &errors }),
            )
                .into_response(),
            RelayError::InsecureTransport { location } => match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
                Err(_) => (StatusCode::BAD_REQUEST, "invalid redirect target").into_response(),
            },
            RelayError::MissingHost => {
                (StatusCode::BAD_REQUEST, "missing or invalid Host header").into_response()
            }
            RelayError::Csrf(_) => (StatusCode::FORBIDDEN, CSRF_REJECTED_BODY).into_response(),
            RelayError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, HeaderValue::from(retry_after_secs))],
                RATE_LIMITED_BODY,
            )
                .into_response(),
            RelayError::MalformedBody { status, detail } => (status, detail).into_response(),
            RelayError::Delivery(e) => {
                tracing::error!(error = %e, "Responding 500 after delivery failure");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
            }
            RelayError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
            }
        }
    }
}
