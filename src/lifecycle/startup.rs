//! Startup orchestration.
//!
//! Order: metrics exporter, mail client, signal forwarding, then the
//! listener. Any failure before the listener is bound is fatal.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::RelayServer;
use crate::lifecycle::{signals::forward_signals, Shutdown};
use crate::mail::{GraphMailer, MailError};
use crate::net::load_tls_config;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid address {address}: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("mail client setup failed: {0}")]
    Mail(#[from] MailError),

    #[error("failed to load TLS material: {0}")]
    Tls(std::io::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

fn parse_addr(address: &str) -> Result<SocketAddr, StartupError> {
    address.parse().map_err(|source| StartupError::Address {
        address: address.to_string(),
        source,
    })
}

/// Bring the relay up and serve until a stop signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?);
    }

    let mailer = Arc::new(GraphMailer::new(&config.mail)?);
    tracing::info!(
        destination = %config.mail.destination,
        sender = %config.mail.sender_mailbox(),
        "Mail delivery configured"
    );

    let shutdown = Shutdown::new();
    forward_signals(shutdown.clone());

    let bind_address = config.listener.bind_address.clone();
    let tls = config.listener.tls.clone();
    let server = RelayServer::new(config, mailer);

    match tls {
        Some(tls) => {
            let addr = parse_addr(&bind_address)?;
            let rustls = load_tls_config(&tls).await.map_err(StartupError::Tls)?;
            server
                .run_tls(addr, rustls, &shutdown)
                .await
                .map_err(StartupError::Serve)?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address)
                .await
                .map_err(|source| StartupError::Bind {
                    address: bind_address.clone(),
                    source,
                })?;
            server.run(listener, &shutdown).await.map_err(StartupError::Serve)?;
        }
    }

    Ok(())
}
