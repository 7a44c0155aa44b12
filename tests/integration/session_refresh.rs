//! Integration tests for the client session against a real backend.
//!
//! A mock Spotify token endpoint sits behind a real `flowcus-server`; the
//! client's [`BackendClient`] and [`Session`] talk to the server over HTTP.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use flowcus::api::{ApiError, BackendClient};
use flowcus::login;
use flowcus::session::{MemoryTokenStore, Session, SessionError, TokenRefresher};
use flowcus_proto::auth::StoredTokens;
use flowcus_server::config::ServerConfig;
use flowcus_server::server::{ServerState, start_server};
use serde_json::json;

const HOUR_MS: u64 = 3_600_000;

/// Counts token endpoint calls.
#[derive(Default)]
struct TokenHits(AtomicUsize);

/// Refresh token `fresh` succeeds, `revoked` gets `invalid_grant`, and
/// code `good` exchanges for a token pair.
async fn mock_token(
    State(hits): State<Arc<TokenHits>>,
    Form(form): Form<HashMap<String, String>>,
) -> axum::response::Response {
    hits.0.fetch_add(1, Ordering::SeqCst);
    let grant = form.get("grant_type").map(String::as_str);
    let code = form.get("code").map(String::as_str);
    let refresh = form.get("refresh_token").map(String::as_str);
    match (grant, code, refresh) {
        (Some("authorization_code"), Some("good"), _) => Json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600
        }))
        .into_response(),
        (Some("refresh_token"), _, Some("fresh")) => {
            Json(json!({"access_token": "access-2", "expires_in": 3600})).into_response()
        }
        (Some("refresh_token"), _, Some("revoked")) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant"})),
        )
            .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
    }
}

async fn mock_today() -> Json<serde_json::Value> {
    Json(json!([{"q": "Act as if what you do makes a difference.", "a": "William James"}]))
}

async fn start_upstream() -> (SocketAddr, Arc<TokenHits>) {
    let hits = Arc::new(TokenHits::default());
    let app = Router::new()
        .route("/api/token", post(mock_token))
        .route("/today", get(mock_today))
        .with_state(Arc::clone(&hits));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

async fn start_backend(upstream: SocketAddr, frontend_redirect_uri: Option<String>) -> String {
    let defaults = ServerConfig::default();
    let config = ServerConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        token_url: format!("http://{upstream}/api/token"),
        quote_url: format!("http://{upstream}/today"),
        frontend_redirect_uri: frontend_redirect_uri
            .unwrap_or_else(|| defaults.frontend_redirect_uri.clone()),
        ..defaults
    };
    let (addr, _handle) = start_server("127.0.0.1:0", Arc::new(ServerState::new(config)))
        .await
        .unwrap();
    format!("http://{addr}")
}

fn expired(refresh_token: &str) -> StoredTokens {
    StoredTokens {
        access_token: Some("stale".to_string()),
        refresh_token: Some(refresh_token.to_string()),
        expires_at_ms: Some(1_000),
    }
}

#[tokio::test]
async fn expired_token_is_refreshed_through_backend() {
    let (upstream, hits) = start_upstream().await;
    let backend = BackendClient::new(start_backend(upstream, None).await);
    let store = MemoryTokenStore::with_tokens(expired("fresh"));
    let mut session = Session::load(store.clone(), backend).unwrap();

    let now = 10_000;
    assert_eq!(session.valid_access_token(now).await.unwrap(), "access-2");

    let saved = store.snapshot();
    assert_eq!(saved.access_token.as_deref(), Some("access-2"));
    assert_eq!(saved.refresh_token.as_deref(), Some("fresh"));
    assert_eq!(saved.expires_at_ms, Some(now + HOUR_MS));

    // Still valid a minute later: no second upstream call.
    assert_eq!(
        session.valid_access_token(now + 60_000).await.unwrap(),
        "access-2"
    );
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn revoked_refresh_token_clears_session() {
    let (upstream, _hits) = start_upstream().await;
    let backend = BackendClient::new(start_backend(upstream, None).await);
    let store = MemoryTokenStore::with_tokens(expired("revoked"));
    let mut session = Session::load(store.clone(), backend).unwrap();

    let err = session.valid_access_token(10_000).await.unwrap_err();
    assert!(matches!(err, SessionError::ReauthRequired));
    assert!(!session.is_authenticated());
    assert_eq!(store.snapshot(), StoredTokens::default());
}

#[tokio::test]
async fn backend_rejection_carries_error_message() {
    let (upstream, _hits) = start_upstream().await;
    let backend = BackendClient::new(start_backend(upstream, None).await);

    let err = backend.refresh("revoked").await.unwrap_err();
    match err {
        ApiError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid refresh token. Please re-authenticate.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn daily_quote_comes_from_backend() {
    let (upstream, _hits) = start_upstream().await;
    let backend = BackendClient::new(start_backend(upstream, None).await);

    let quote = backend.daily_quote().await.unwrap();
    assert_eq!(quote.quote, "Act as if what you do makes a difference.");
    assert_eq!(quote.author, "William James");
}

#[tokio::test]
async fn login_redirect_lands_in_capture_listener() {
    let (upstream, _hits) = start_upstream().await;
    let (capture_addr, pending) = login::start_capture("127.0.0.1:0").await.unwrap();
    let base = start_backend(upstream, Some(format!("http://{capture_addr}/callback"))).await;

    // The browser follows the backend redirect into the listener.
    let resp = reqwest::get(format!("{base}/callback?code=good"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let tokens = pending.wait().await.unwrap();
    assert_eq!(tokens.access_token, "access-1");
    assert_eq!(tokens.refresh_token, "refresh-1");

    let store = MemoryTokenStore::default();
    let mut session = Session::load(store.clone(), BackendClient::new(base)).unwrap();
    session
        .store_initial(&tokens.access_token, &tokens.refresh_token, 5_000)
        .unwrap();
    assert!(session.is_authenticated());
    assert_eq!(store.snapshot().expires_at_ms, Some(5_000 + HOUR_MS));
    assert_eq!(session.valid_access_token(6_000).await.unwrap(), "access-1");
}
