//! Route handlers.
//!
//! The two submission endpoints share one flow: anti-forgery check, body
//! decoding, validation, a single delivery attempt, then a redirect to the page
//! configured for that form.

use axum::{
    extract::State,
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::forms::{self, Submission, SubmissionKind};
use crate::http::error::RelayError;
use crate::http::extract::SubmissionBody;
use crate::http::server::AppState;
use crate::observability::metrics::{self, SubmissionOutcome};
use crate::security::csrf::{self, SessionSecret};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenBody {
    pub csrf_token: String,
}

/// `GET /csrf-token`
///
/// Reuses the session already in the jar; otherwise starts one and sets its
/// cookie.
pub async fn issue_csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfTokenBody>) {
    let cookie_name = &state.config.security.csrf_cookie_name;
    let (session, jar) = match SessionSecret::from_jar(&jar, cookie_name) {
        Some(existing) => (existing, jar),
        None => {
            let session = SessionSecret::generate();
            let cookie = session.cookie(cookie_name);
            (session, jar.add(cookie))
        }
    };

    let csrf_token = state.csrf.issue_token(&session);
    (jar, Json(CsrfTokenBody { csrf_token }))
}

/// `POST /submit-form`
pub async fn submit_contact(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: SubmissionBody,
) -> Result<Response, RelayError> {
    process(&state, &jar, &headers, SubmissionKind::Contact, body).await
}

/// `POST /work-application`
pub async fn submit_application(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: SubmissionBody,
) -> Result<Response, RelayError> {
    process(&state, &jar, &headers, SubmissionKind::WorkApplication, body).await
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

async fn process(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
    kind: SubmissionKind,
    body: SubmissionBody,
) -> Result<Response, RelayError> {
    csrf::verify_request(
        state.csrf.as_ref(),
        jar,
        headers,
        &state.config.security.csrf_cookie_name,
        body.csrf_token(),
    )
    .map_err(|rejection| {
        tracing::warn!(kind = %kind, reason = rejection.reason(), "Anti-forgery check failed");
        metrics::record_security_rejection(rejection.reason());
        RelayError::Csrf(rejection)
    })?;

    let raw = body.into_fields().inspect_err(|e| {
        tracing::info!(kind = %kind, error = %e, "Submission body could not be decoded");
    })?;
    let submission = Submission::from_fields(kind, &raw);

    let sanitized = forms::validate(&submission).map_err(|errors| {
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        tracing::info!(kind = %kind, fields = ?fields, "Submission rejected by validation");
        metrics::record_submission(kind, SubmissionOutcome::Invalid);
        RelayError::Invalid(errors)
    })?;

    if let Err(e) = state.delivery.deliver(&sanitized).await {
        metrics::record_submission(kind, SubmissionOutcome::DeliveryFailed);
        return Err(RelayError::Delivery(e));
    }
    metrics::record_submission(kind, SubmissionOutcome::Accepted);

    let target = thank_you_page(state, kind);
    let location = HeaderValue::from_str(target)
        .map_err(|_| RelayError::Internal(format!("redirect target {target:?} is not a valid header")))?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}

fn thank_you_page(state: &AppState, kind: SubmissionKind) -> &str {
    match kind {
        SubmissionKind::Contact => &state.config.redirects.contact_thank_you,
        SubmissionKind::WorkApplication => &state.config.redirects.application_thank_you,
    }
}
