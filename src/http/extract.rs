//! Submission body extraction.
//!
//! Browsers post URL-encoded forms; scripted clients post JSON. Both are read
//! into the same loose name → value map. Problems with the body's shape are
//! held back rather than rejected here, so the anti-forgery check always runs
//! before a client learns anything about its fields.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
};
use serde_json::Value;

use crate::forms::pipeline::fields;
use crate::forms::RawFields;
use crate::http::error::RelayError;

pub const UNSUPPORTED_CONTENT_TYPE: &str = "unsupported content type";
pub const NOT_A_JSON_OBJECT: &str = "JSON body must be an object";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    UrlEncoded,
}

fn body_format(headers: &HeaderMap) -> Option<BodyFormat> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    if essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json")) {
        Some(BodyFormat::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyFormat::UrlEncoded)
    } else {
        None
    }
}

/// A buffered request body, decoded as far as it could be.
#[derive(Debug)]
pub enum SubmissionBody {
    Fields(RawFields),
    /// The body could not be read as fields. Reported only after the
    /// anti-forgery check passes.
    Undecodable(RelayError),
}

impl SubmissionBody {
    /// The `_csrf` field, when the body decoded and carried one.
    pub fn csrf_token(&self) -> Option<&str> {
        match self {
            SubmissionBody::Fields(raw) => raw.get(fields::CSRF_TOKEN),
            SubmissionBody::Undecodable(_) => None,
        }
    }

    pub fn into_fields(self) -> Result<RawFields, RelayError> {
        match self {
            SubmissionBody::Fields(raw) => Ok(raw),
            SubmissionBody::Undecodable(err) => Err(err),
        }
    }
}

impl<S> FromRequest<S> for SubmissionBody
where
    S: Send + Sync,
{
    type Rejection = RelayError;

    /// Fails only when the body cannot be buffered, e.g. it exceeds the
    /// configured size limit.
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let format = body_format(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| RelayError::MalformedBody {
                status: rejection.status(),
                detail: rejection.body_text(),
            })?;

        Ok(match format {
            Some(BodyFormat::UrlEncoded) => SubmissionBody::Fields(decode_urlencoded(&bytes)),
            Some(BodyFormat::Json) => match decode_json(&bytes) {
                Ok(raw) => SubmissionBody::Fields(raw),
                Err(err) => SubmissionBody::Undecodable(err),
            },
            None => SubmissionBody::Undecodable(bad_request(UNSUPPORTED_CONTENT_TYPE)),
        })
    }
}

fn bad_request(detail: impl Into<String>) -> RelayError {
    RelayError::MalformedBody {
        status: StatusCode::BAD_REQUEST,
        detail: detail.into(),
    }
}

fn decode_urlencoded(bytes: &[u8]) -> RawFields {
    url::form_urlencoded::parse(bytes).into_owned().collect()
}

fn decode_json(bytes: &[u8]) -> Result<RawFields, RelayError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| bad_request(format!("malformed JSON body: {e}")))?;
    let Value::Object(object) = value else {
        return Err(bad_request(NOT_A_JSON_OBJECT));
    };
    Ok(object
        .into_iter()
        .filter_map(|(name, value)| scalar_text(value).map(|text| (name, text)))
        .collect())
}

/// Text form of a JSON scalar. Arrays contribute their first scalar; null
/// and nested objects count as absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.into_iter().find_map(scalar_text),
        Value::Null | Value::Object(_) => None,
    }
}
