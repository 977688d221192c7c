//! Relay proxy (v0.1)
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                   RELAY PROXY                     │
//!   GET /https://x.test   │  ┌──────────┐   ┌────────────┐   ┌─────────────┐  │
//!   ──────────────────────┼─▶│  origin  │──▶│ rate limit │──▶│   proxy     │──┼──▶ https://x.test
//!                         │  │  guard   │   │ (per IP)   │   │  handler    │  │
//!   ◀─────────────────────┼──│ +CORS hdr│◀──│ 429 early  │◀──│ 400 / 500   │◀─┼───
//!                         │  └──────────┘   └────────────┘   └─────────────┘  │
//!                         │                                                   │
//!                         │  config · request id · tracing · metrics · signals│
//!                         └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use relay_proxy::config::loader;
use relay_proxy::lifecycle::startup;
use relay_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "relay-proxy")]
#[command(about = "Single-hop HTTP relay with an origin allow-list and per-IP rate limiting")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long, env = "RELAY_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port (overrides the file and PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match loader::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = args.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("relay-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy exited with error");
            ExitCode::FAILURE
        }
    }
}
