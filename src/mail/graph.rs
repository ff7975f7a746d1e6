//! Microsoft Graph mail client.
//!
//! Authenticates with the OAuth2 client-credentials grant and posts the
//! message to `/v1.0/users/{sender}/sendMail`. Access tokens are cached until
//! shortly before they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::config::MailConfig;
use crate::mail::{MailError, Mailer, OutboundEmail};

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Refresh this long before the provider says a token expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: GraphMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage<'a> {
    subject: &'a str,
    body: GraphBody<'a>,
    to_recipients: [GraphRecipient<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphRecipient<'a> {
    email_address: GraphAddress<'a>,
}

#[derive(Serialize)]
struct GraphAddress<'a> {
    address: &'a str,
}

/// Mailer backed by the Microsoft Graph API.
pub struct GraphMailer {
    client: Client,
    token_url: Url,
    send_url: Url,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl GraphMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut token_url = Url::parse(&config.token_base_url)?;
        token_url
            .path_segments_mut()
            .map_err(|_| MailError::InvalidEndpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend([config.tenant_id.as_str(), "oauth2", "v2.0", "token"]);

        let mut send_url = Url::parse(&config.graph_base_url)?;
        send_url
            .path_segments_mut()
            .map_err(|_| MailError::InvalidEndpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["v1.0", "users", config.sender_mailbox(), "sendMail"]);

        Ok(Self {
            client,
            token_url,
            send_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    pub fn send_url(&self) -> &Url {
        &self.send_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    async fn access_token(&self) -> Result<String, MailError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::TokenRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::debug!(expires_in = token.expires_in, "Obtained Graph access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl Mailer for GraphMailer {
    async fn send_email(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let token = self.access_token().await?;
        let request = SendMailRequest {
            message: GraphMessage {
                subject: &email.subject,
                body: GraphBody {
                    content_type: "HTML",
                    content: &email.html_body,
                },
                to_recipients: [GraphRecipient {
                    email_address: GraphAddress {
                        address: &email.to_address,
                    },
                }],
            },
            save_to_sent_items: true,
        };

        let response = self
            .client
            .post(self.send_url.clone())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                status: status.as_u16(),
                detail,
            })
        }
    }
}
