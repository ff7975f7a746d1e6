//! Form relay (v1)
//!
//! Accepts contact and work-application submissions from a public website,
//! screens them, and forwards each accepted one as a single email.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                   FORM RELAY                     │
//!                     │                                                  │
//!   Browser POST      │  ┌──────────┐   ┌────────────┐   ┌───────────┐   │
//!   ──────────────────┼─▶│ security │──▶│   forms    │──▶│   mail    │───┼──▶ Microsoft
//!                     │  │   gate   │   │ validation │   │ delivery  │   │     Graph
//!                     │  └──────────┘   └────────────┘   └───────────┘   │
//!   302 / 400 / 500   │        │               │               │         │
//!   ◀─────────────────┼────────┴───────────────┴───────────────┘         │
//!                     │                                                  │
//!                     │  config · observability · lifecycle · net        │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use form_relay::config::load_config;
use form_relay::lifecycle;
use form_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "form-relay")]
#[command(about = "Relays website form submissions to a mailbox", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus environment if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("form-relay: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        println!("configuration ok");
        return ExitCode::SUCCESS;
    }

    init_logging(&config.observability.log_level);
    tracing::info!("form-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        rate_limit = config.rate_limit.enabled,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
