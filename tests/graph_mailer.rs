//! Microsoft Graph client against a local mock of the provider.

use std::sync::atomic::Ordering;

use form_relay::config::MailConfig;
use form_relay::mail::{GraphMailer, MailError, Mailer, OutboundEmail};

mod common;
use common::start_mock_graph;

fn mail_config(base: &str) -> MailConfig {
    MailConfig {
        destination: "inbox@example.org".into(),
        sender: Some("relay@example.org".into()),
        tenant_id: "tenant-42".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        token_base_url: base.to_string(),
        graph_base_url: base.to_string(),
        timeout_secs: 5,
    }
}

fn email() -> OutboundEmail {
    OutboundEmail {
        subject: "Form Submission: Hello".into(),
        to_address: "inbox@example.org".into(),
        html_body: "<div><p>Hi there</p></div>".into(),
    }
}

#[tokio::test]
async fn test_sends_message_with_bearer_token() {
    let (addr, log) = start_mock_graph().await;
    let mailer = GraphMailer::new(&mail_config(&format!("http://{}", addr))).unwrap();

    mailer.send_email(&email()).await.unwrap();

    assert_eq!(log.token_requests.load(Ordering::SeqCst), 1);
    let sends = log.send_requests.lock().unwrap();
    assert_eq!(sends.len(), 1);
    let (auth, payload) = &sends[0];
    assert_eq!(auth.as_deref(), Some("Bearer mock-access-token"));
    assert_eq!(payload["message"]["subject"], "Form Submission: Hello");
    assert_eq!(payload["message"]["body"]["contentType"], "HTML");
    assert_eq!(payload["message"]["body"]["content"], "<div><p>Hi there</p></div>");
    assert_eq!(
        payload["message"]["toRecipients"][0]["emailAddress"]["address"],
        "inbox@example.org"
    );
}

#[tokio::test]
async fn test_token_is_cached_between_sends() {
    let (addr, log) = start_mock_graph().await;
    let mailer = GraphMailer::new(&mail_config(&format!("http://{}", addr))).unwrap();

    mailer.send_email(&email()).await.unwrap();
    mailer.send_email(&email()).await.unwrap();

    assert_eq!(log.token_requests.load(Ordering::SeqCst), 1);
    assert_eq!(log.send_requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_message_is_single_attempt() {
    let (addr, log) = start_mock_graph().await;
    log.send_status.store(403, Ordering::SeqCst);
    let mailer = GraphMailer::new(&mail_config(&format!("http://{}", addr))).unwrap();

    let err = mailer.send_email(&email()).await.unwrap_err();
    match err {
        MailError::Rejected { status, detail } => {
            assert_eq!(status, 403);
            assert!(detail.contains("ErrorSendAsDenied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(log.send_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_token_rejection_skips_send() {
    let (addr, log) = start_mock_graph().await;
    log.token_status.store(401, Ordering::SeqCst);
    let mailer = GraphMailer::new(&mail_config(&format!("http://{}", addr))).unwrap();

    let err = mailer.send_email(&email()).await.unwrap_err();
    assert!(matches!(err, MailError::TokenRejected { status: 401, .. }));
    assert!(log.send_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mailer = GraphMailer::new(&mail_config(&format!("http://{}", addr))).unwrap();
    let err = mailer.send_email(&email()).await.unwrap_err();
    assert!(matches!(err, MailError::Transport(_)));
}
