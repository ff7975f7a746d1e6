//! Anti-forgery tokens.
//!
//! Each browser session holds a random secret in an `HttpOnly`, `Secure`,
//! `SameSite=Strict` cookie. `GET /csrf-token` hands out salted digests of
//! that secret; a state-changing request must present one of them, either in
//! the `_csrf` body field or in a token header. A cross-site page can neither
//! read the cookie nor obtain a matching token, so it cannot forge a post.
//!
//! Token format: `{salt}-{base64url(sha256("{salt}-{secret}"))}`.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::prelude::*;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

const SECRET_BYTES: usize = 18;
const SALT_LEN: usize = 8;

/// Headers checked, in order, when the body carries no token.
pub const TOKEN_HEADERS: [&str; 4] = ["csrf-token", "xsrf-token", "x-csrf-token", "x-xsrf-token"];

/// Why a request failed anti-forgery verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CsrfRejection {
    #[error("no anti-forgery session cookie")]
    MissingSession,
    #[error("no anti-forgery token presented")]
    MissingToken,
    #[error("token does not match session")]
    Mismatch,
}

impl CsrfRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            CsrfRejection::MissingSession => "csrf_missing_session",
            CsrfRejection::MissingToken => "csrf_missing_token",
            CsrfRejection::Mismatch => "csrf_mismatch",
        }
    }
}

/// Per-session secret carried in the anti-forgery cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Fresh secret from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Read the secret from the request's cookies.
    pub fn from_jar(jar: &CookieJar, cookie_name: &str) -> Option<Self> {
        jar.get(cookie_name)
            .map(|cookie| cookie.value().trim())
            .filter(|value| !value.is_empty() && is_base64url(value))
            .map(|value| Self(value.to_string()))
    }

    /// Cookie binding this secret to the browser session.
    pub fn cookie(&self, cookie_name: &str) -> Cookie<'static> {
        Cookie::build((cookie_name.to_owned(), self.0.clone()))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .build()
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

/// Token issuance and verification, independent of the HTTP framework.
pub trait AntiForgery: Send + Sync {
    fn issue_token(&self, session: &SessionSecret) -> String;
    fn verify_token(&self, session: &SessionSecret, presented: &str) -> bool;
}

/// Salted SHA-256 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedTokens;

impl SaltedTokens {
    fn digest(salt: &str, session: &SessionSecret) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b"-");
        hasher.update(session.as_str().as_bytes());
        BASE64_URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl AntiForgery for SaltedTokens {
    fn issue_token(&self, session: &SessionSecret) -> String {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LEN)
            .map(char::from)
            .collect();
        let digest = Self::digest(&salt, session);
        format!("{}-{}", salt, digest)
    }

    fn verify_token(&self, session: &SessionSecret, presented: &str) -> bool {
        let Some((salt, digest)) = presented.split_once('-') else {
            return false;
        };
        if salt.is_empty() || !salt.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        let expected = Self::digest(salt, session);
        expected.len() == digest.len() && bool::from(expected.as_bytes().ct_eq(digest.as_bytes()))
    }
}

/// Token presented with a request: the body field wins, then the headers.
pub fn presented_token<'a>(headers: &'a HeaderMap, body_token: Option<&'a str>) -> Option<&'a str> {
    body_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            TOKEN_HEADERS
                .iter()
                .filter_map(|name| headers.get(*name))
                .filter_map(|v| v.to_str().ok())
                .map(str::trim)
                .find(|t| !t.is_empty())
        })
}

/// Full check for a state-changing request.
pub fn verify_request(
    tokens: &dyn AntiForgery,
    jar: &CookieJar,
    headers: &HeaderMap,
    cookie_name: &str,
    body_token: Option<&str>,
) -> Result<(), CsrfRejection> {
    let session = SessionSecret::from_jar(jar, cookie_name).ok_or(CsrfRejection::MissingSession)?;
    let token = presented_token(headers, body_token).ok_or(CsrfRejection::MissingToken)?;
    if tokens.verify_token(&session, token) {
        Ok(())
    } else {
        Err(CsrfRejection::Mismatch)
    }
}

fn is_base64url(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    fn jar_from(cookie_header: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie_header).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_issued_token_verifies_against_its_session() {
        let session = SessionSecret::generate();
        let token = SaltedTokens.issue_token(&session);
        assert!(SaltedTokens.verify_token(&session, &token));
    }

    #[test]
    fn test_tokens_are_salted() {
        let session = SessionSecret::generate();
        let a = SaltedTokens.issue_token(&session);
        let b = SaltedTokens.issue_token(&session);
        assert_ne!(a, b);
        assert!(SaltedTokens.verify_token(&session, &b));
    }

    #[test]
    fn test_token_from_other_session_is_rejected() {
        let token = SaltedTokens.issue_token(&SessionSecret::generate());
        assert!(!SaltedTokens.verify_token(&SessionSecret::generate(), &token));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let session = SessionSecret::generate();
        for token in ["", "nodash", "-digest", "s@lt-digest", "abc-"] {
            assert!(!SaltedTokens.verify_token(&session, token), "accepted {:?}", token);
        }
    }

    #[test]
    fn test_digest_of_wrong_length_is_rejected() {
        let session = SessionSecret::generate();
        let token = SaltedTokens.issue_token(&session);
        assert!(!SaltedTokens.verify_token(&session, &token[..token.len() - 1]));
        assert!(!SaltedTokens.verify_token(&session, &format!("{token}A")));
    }

    #[test]
    fn test_session_cookie_round_trip() {
        let session = SessionSecret::generate();
        let cookie = session.cookie("_csrf");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));

        let jar = jar_from(&format!("theme=dark; _csrf={}", cookie.value()));
        assert_eq!(SessionSecret::from_jar(&jar, "_csrf"), Some(session));
    }

    #[test]
    fn test_cookie_with_foreign_characters_is_ignored() {
        assert_eq!(SessionSecret::from_jar(&jar_from("_csrf=abc%3Cdef"), "_csrf"), None);
        assert_eq!(SessionSecret::from_jar(&jar_from("_csrf="), "_csrf"), None);
        assert_eq!(SessionSecret::from_jar(&CookieJar::new(), "_csrf"), None);
    }

    #[test]
    fn test_body_token_takes_precedence_over_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-csrf-token", HeaderValue::from_static("from-header"));
        assert_eq!(presented_token(&headers, Some("from-body")), Some("from-body"));
        assert_eq!(presented_token(&headers, Some("  ")), Some("from-header"));
        assert_eq!(presented_token(&headers, None), Some("from-header"));
        assert_eq!(presented_token(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_verify_request_reports_each_failure() {
        let session = SessionSecret::generate();
        let token = SaltedTokens.issue_token(&session);
        let jar = CookieJar::new().add(session.cookie("_csrf"));
        let headers = HeaderMap::new();

        assert_eq!(verify_request(&SaltedTokens, &jar, &headers, "_csrf", Some(&token)), Ok(()));
        assert_eq!(
            verify_request(&SaltedTokens, &CookieJar::new(), &headers, "_csrf", Some(&token)),
            Err(CsrfRejection::MissingSession)
        );
        assert_eq!(
            verify_request(&SaltedTokens, &jar, &headers, "_csrf", None),
            Err(CsrfRejection::MissingToken)
        );
        assert_eq!(
            verify_request(&SaltedTokens, &jar, &headers, "_csrf", Some("abcdefgh-wrong")),
            Err(CsrfRejection::Mismatch)
        );
    }
}
