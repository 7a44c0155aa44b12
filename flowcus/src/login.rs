//! Captures tokens from the backend's post-login redirect.
//!
//! The backend finishes the OAuth code exchange and redirects the browser
//! to `http://127.0.0.1:3001/callback?access_token=..&refresh_token=..`.
//! A short-lived local listener on that address receives the tokens and
//! shuts down once it has them.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Errors from the login capture.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The redirect listener could not be bound.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        /// Address that was attempted.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The listener stopped before tokens arrived.
    #[error("login listener stopped before receiving tokens")]
    Aborted,
}

/// Tokens delivered by the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedTokens {
    /// Access token.
    pub access_token: String,
    /// Refresh token; may be empty if the backend did not get one.
    pub refresh_token: String,
}

#[derive(Debug, serde::Deserialize)]
struct RedirectParams {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

struct CaptureState {
    sender: Mutex<Option<oneshot::Sender<CapturedTokens>>>,
}

/// A running capture listener.
pub struct PendingLogin {
    tokens: oneshot::Receiver<CapturedTokens>,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl PendingLogin {
    /// Waits for the redirect, then stops the listener.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Aborted`] if the listener exits first.
    pub async fn wait(self) -> Result<CapturedTokens, LoginError> {
        let result = self.tokens.await.map_err(|_| LoginError::Aborted);
        let _ = self.shutdown.send(());
        let _ = self.server.await;
        result
    }
}

async fn callback(
    State(state): State<Arc<CaptureState>>,
    Query(params): Query<RedirectParams>,
) -> Response {
    let Some(access_token) = params.access_token.filter(|t| !t.is_empty()) else {
        tracing::warn!("login redirect without access token");
        return (
            StatusCode::BAD_REQUEST,
            "Access token missing. Please log in again.",
        )
            .into_response();
    };

    let tokens = CapturedTokens {
        access_token,
        refresh_token: params.refresh_token.unwrap_or_default(),
    };
    if let Some(sender) = state.sender.lock().take() {
        let _ = sender.send(tokens);
        tracing::info!("login tokens captured");
    }
    "Login complete. You can close this tab and return to Flowcus.".into_response()
}

/// Starts the capture listener on `bind`.
///
/// Returns the bound address and a handle to wait on.
///
/// # Errors
///
/// Returns [`LoginError::Bind`] if the address cannot be bound.
pub async fn start_capture(bind: &str) -> Result<(SocketAddr, PendingLogin), LoginError> {
    let bind_error = |source| LoginError::Bind {
        addr: bind.to_string(),
        source,
    };
    let listener = TcpListener::bind(bind).await.map_err(bind_error)?;
    let addr = listener.local_addr().map_err(bind_error)?;

    let (token_tx, token_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let state = Arc::new(CaptureState {
        sender: Mutex::new(Some(token_tx)),
    });
    let app = Router::new()
        .route("/callback", get(callback))
        .with_state(state);

    tracing::info!(%addr, "waiting for login redirect");
    let server = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "login listener failed");
        }
    });

    Ok((
        addr,
        PendingLogin {
            tokens: token_rx,
            shutdown: shutdown_tx,
            server,
        },
    ))
}
