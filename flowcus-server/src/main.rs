//! Flowcus backend -- OAuth code exchange, token refresh, and daily quote.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:3000
//! SPOTIFY_CLIENT_ID=... SPOTIFY_CLIENT_SECRET=... cargo run --bin flowcus-server
//!
//! # Run on a custom port
//! PORT=8080 cargo run --bin flowcus-server
//! ```

use std::sync::Arc;

use clap::Parser;
use flowcus_server::config::{ServerCliArgs, ServerConfig};
use flowcus_server::server::{self, ServerState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting flowcus server");

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(ServerState::new(config));

    match server::start_server(&bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "server is running");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
