//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use form_relay::config::GatewayConfig;
use form_relay::mail::{MailError, Mailer, OutboundEmail};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const HOST: &str = "forms.example.org";
pub const DESTINATION: &str = "inbox@example.org";
pub const CONTACT_THANKS: &str = "https://example.org/thank-you";
pub const APPLICATION_THANKS: &str = "https://example.org/application-thank-you";

pub const VALID_CONTACT: &str = "full-name=Jane+Doe&phone-number=%2B14155551234\
&email-address=jane%40example.com&subject=Hello&message=Hi+there";
pub const VALID_APPLICATION: &str = "full-name=John+Smith&phone-number=07911123456\
&email-address=john%40example.com&right-to-work=Yes";

/// In-memory mailer that records what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let mailer = Self::default();
        mailer.fail.store(true, Ordering::SeqCst);
        Arc::new(mailer)
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                detail: "mailbox unavailable".into(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A configuration that passes validation, with HTTPS enforced behind one
/// trusted proxy hop.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.mail.destination = DESTINATION.into();
    config.mail.tenant_id = "tenant".into();
    config.mail.client_id = "client".into();
    config.mail.client_secret = "secret".into();
    config.security.enforce_https = true;
    config.security.trust_proxy_hops = 1;
    config.rate_limit.enabled = true;
    config.rate_limit.max_requests = 100;
    config.rate_limit.window_secs = 900;
    config.redirects.contact_thank_you = CONTACT_THANKS.into();
    config.redirects.application_thank_you = APPLICATION_THANKS.into();
    config
}

/// Request builder for a request that arrived over HTTPS at the proxy.
pub fn secure(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST)
        .header("x-forwarded-proto", "https")
        .header("x-forwarded-for", "203.0.113.7")
}

/// Anti-forgery session cookie and a token bound to it.
pub struct CsrfSession {
    pub cookie: String,
    pub token: String,
}

/// Obtain a session via `GET /csrf-token`.
pub async fn csrf_session(router: &Router) -> CsrfSession {
    let response = router
        .clone()
        .oneshot(secure("GET", "/csrf-token").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    CsrfSession {
        cookie,
        token: json["csrfToken"].as_str().unwrap().to_string(),
    }
}

/// A URL-encoded form post carrying the session cookie and the token field.
pub fn form_post(uri: &str, session: &CsrfSession, body: &str) -> Request<Body> {
    let body = format!("{}&_csrf={}", body, session.token);
    secure("POST", uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, &session.cookie)
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Requests seen by the mock Graph service.
#[derive(Default)]
pub struct GraphLog {
    pub token_requests: AtomicUsize,
    pub send_requests: Mutex<Vec<(Option<String>, serde_json::Value)>>,
    /// Status returned by `sendMail`; 0 means 202.
    pub send_status: AtomicU16,
    /// Status returned by the token endpoint; 0 means 200.
    pub token_status: AtomicU16,
}

async fn mock_token(State(log): State<Arc<GraphLog>>, body: String) -> Response {
    log.token_requests.fetch_add(1, Ordering::SeqCst);
    assert!(body.contains("grant_type=client_credentials"));
    match log.token_status.load(Ordering::SeqCst) {
        0 => Json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "mock-access-token",
        }))
        .into_response(),
        status => (StatusCode::from_u16(status).unwrap(), "invalid_client").into_response(),
    }
}

async fn mock_send(
    State(log): State<Arc<GraphLog>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    log.send_requests.lock().unwrap().push((auth, payload));
    match log.send_status.load(Ordering::SeqCst) {
        0 => StatusCode::ACCEPTED.into_response(),
        status => (StatusCode::from_u16(status).unwrap(), "ErrorSendAsDenied").into_response(),
    }
}

/// Start a local stand-in for the identity platform and Graph API.
pub async fn start_mock_graph() -> (SocketAddr, Arc<GraphLog>) {
    let log = Arc::new(GraphLog::default());
    let app = Router::new()
        .route("/{tenant}/oauth2/v2.0/token", post(mock_token))
        .route("/v1.0/users/{sender}/sendMail", post(mock_send))
        .with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, log)
}
