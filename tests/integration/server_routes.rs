//! Integration tests for the backend routes.
//!
//! Each test starts a mock upstream (Spotify token endpoint + ZenQuotes)
//! and a real `flowcus-server` on ephemeral ports, then drives the routes
//! over HTTP.

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
use flowcus_server::config::ServerConfig;
use flowcus_server::server::{ServerState, start_server};
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Mock upstream
// ---------------------------------------------------------------------------

/// Counters shared with the mock upstream handlers.
#[derive(Default)]
struct UpstreamHits {
    quotes: AtomicUsize,
    tokens: AtomicUsize,
}

/// Mock Spotify token endpoint.
///
/// Code `good` and refresh token `fresh` succeed; refresh token `revoked`
/// gets `invalid_grant`; anything else is a 500.
async fn mock_token(
    State(hits): State<Arc<UpstreamHits>>,
    Form(form): Form<HashMap<String, String>>,
) -> axum::response::Response {
    hits.tokens.fetch_add(1, Ordering::SeqCst);
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
            Json(json!({"error": "invalid_grant", "error_description": "Refresh token revoked"})),
        )
            .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
    }
}

/// Mock ZenQuotes `today` endpoint.
async fn mock_today(State(hits): State<Arc<UpstreamHits>>) -> Json<Value> {
    hits.quotes.fetch_add(1, Ordering::SeqCst);
    Json(json!([{"q": "Well begun is half done.", "a": "Aristotle", "h": ""}]))
}

/// Mock endpoint returning an empty quote list.
async fn mock_empty() -> Json<Value> {
    Json(json!([]))
}

async fn start_upstream() -> (SocketAddr, Arc<UpstreamHits>) {
    let hits = Arc::new(UpstreamHits::default());
    let app = Router::new()
        .route("/api/token", post(mock_token))
        .route("/today", get(mock_today))
        .route("/empty", get(mock_empty))
        .with_state(Arc::clone(&hits));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config_for(upstream: SocketAddr, quote_path: &str) -> ServerConfig {
    ServerConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        token_url: format!("http://{upstream}/api/token"),
        quote_url: format!("http://{upstream}{quote_path}"),
        ..ServerConfig::default()
    }
}

async fn start_backend(config: ServerConfig) -> SocketAddr {
    let state = Arc::new(ServerState::new(config));
    let (addr, _handle) = start_server("127.0.0.1:0", state).await.unwrap();
    addr
}

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

// ===========================================================================
// GET /api/today
// ===========================================================================

#[tokio::test]
async fn today_is_fetched_once_per_day() {
    let (upstream, hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;
    let client = reqwest::Client::new();

    let first: Value = client
        .get(format!("http://{backend}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = client
        .get(format!("http://{backend}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first["quote"], "Well begun is half done.");
    assert_eq!(first["author"], "Aristotle");
    assert_eq!(hits.quotes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn today_empty_upstream_is_404() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/empty")).await;

    let resp = reqwest::get(format!("http://{backend}/api/today"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No quote found");
}

#[tokio::test]
async fn today_upstream_failure_is_500() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/missing")).await;

    let resp = reqwest::get(format!("http://{backend}/api/today"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to fetch quote");
}

// ===========================================================================
// GET /callback
// ===========================================================================

#[tokio::test]
async fn callback_without_code_is_400() {
    let (upstream, hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;

    let resp = no_redirect_client()
        .get(format!("http://{backend}/callback"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Authorization code not provided");
    assert_eq!(hits.tokens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn callback_redirects_with_tokens() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;

    let resp = no_redirect_client()
        .get(format!("http://{backend}/callback?code=good"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::FOUND);

    let location = resp.headers()[reqwest::header::LOCATION].to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(url.path(), "/callback");
    assert_eq!(url.port(), Some(3001));
    assert_eq!(params["access_token"], "access-1");
    assert_eq!(params["refresh_token"], "refresh-1");
}

#[tokio::test]
async fn callback_exchange_failure_is_500() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;

    let resp = no_redirect_client()
        .get(format!("http://{backend}/callback?code=bad"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "Authentication failed");
}

// ===========================================================================
// POST /refresh_token
// ===========================================================================

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{backend}/refresh_token"))
        .json(&json!({"refreshToken": "fresh"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["accessToken"], "access-2");
}

#[tokio::test]
async fn refresh_without_token_is_400() {
    let (upstream, hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({"refreshToken": ""})] {
        let resp = client
            .post(format!("http://{backend}/refresh_token"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Refresh token is required");
    }

    // No body at all gets the same answer.
    let resp = client
        .post(format!("http://{backend}/refresh_token"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(hits.tokens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refresh_invalid_grant_asks_for_reauth() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{backend}/refresh_token"))
        .json(&json!({"refreshToken": "revoked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid refresh token. Please re-authenticate.");
}

#[tokio::test]
async fn refresh_upstream_failure_is_500_with_details() {
    let (upstream, _hits) = start_upstream().await;
    let backend = start_backend(config_for(upstream, "/today")).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{backend}/refresh_token"))
        .json(&json!({"refreshToken": "explode"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to refresh access token");
    assert_eq!(body["details"], "upstream exploded");
}
