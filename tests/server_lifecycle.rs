//! Full HTTP round trips through a bound server.

use std::time::Duration;

use form_relay::{RelayServer, Shutdown};
use reqwest::{header, redirect::Policy, StatusCode};
use tokio::net::TcpListener;

mod common;
use common::{test_config, RecordingMailer, CONTACT_THANKS, VALID_CONTACT};

#[tokio::test]
async fn test_round_trip_and_graceful_shutdown() {
    let mailer = RecordingMailer::new();
    let server = RelayServer::new(test_config(), mailer.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move { server.run(listener, &server_shutdown).await });

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();
    let base = format!("http://{}", addr);

    let token_response = client
        .get(format!("{}/csrf-token", base))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(token_response.status(), StatusCode::OK);
    let cookie = token_response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let json: serde_json::Value = token_response.json().await.unwrap();
    let token = json["csrfToken"].as_str().unwrap();

    let response = client
        .post(format!("{}/submit-form", base))
        .header("x-forwarded-proto", "https")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("{}&_csrf={}", VALID_CONTACT, token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], CONTACT_THANKS);
    assert_eq!(mailer.sent().len(), 1);

    let insecure = client
        .get(format!("{}/csrf-token", base))
        .send()
        .await
        .unwrap();
    assert_eq!(insecure.status(), StatusCode::FOUND);
    assert!(insecure.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .starts_with("https://127.0.0.1:"));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
