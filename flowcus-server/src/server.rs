//! Shared server state, the route table, and server startup.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::oauth;
use crate::quotes::{self, QuoteCache};

/// State shared by every request handler.
pub struct ServerState {
    /// Resolved configuration (credentials, upstream URLs).
    pub config: ServerConfig,
    /// Pooled HTTP client for upstream calls.
    pub http: reqwest::Client,
    /// Quote of the day, cached per calendar date.
    pub quotes: QuoteCache,
}

impl ServerState {
    /// Creates state with a default HTTP client and an empty quote cache.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Creates state around a pre-built HTTP client.
    #[must_use]
    pub fn with_client(config: ServerConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            quotes: QuoteCache::new(),
        }
    }
}

/// Builds the application router.
///
/// CORS is permissive: the client may be served from any origin.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/login", get(oauth::login))
        .route("/callback", get(oauth::callback))
        .route("/refresh_token", post(oauth::refresh))
        .route("/api/today", get(quotes::today))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the server with the given state.
///
/// Returns the bound address (useful with port `0`) and the serving task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "flowcus server error");
        }
    });

    Ok((bound_addr, handle))
}
