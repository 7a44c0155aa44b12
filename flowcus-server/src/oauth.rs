//! Spotify OAuth: login redirect, code exchange, and token refresh.
//!
//! The backend holds the client secret, so both grants go through here.
//! Tokens are handed to the client as query parameters on the frontend
//! redirect; refreshes are a JSON round trip on `POST /refresh_token`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use flowcus_proto::auth::{ErrorBody, RefreshRequest, RefreshResponse, SpotifyTokenResponse};
use url::Url;

use crate::config::ServerConfig;
use crate::server::ServerState;
use crate::upstream::{self, UpstreamError};

/// Scopes requested during login.
pub const SPOTIFY_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "streaming",
];

/// Builds the Spotify authorization URL the user is sent to.
///
/// # Errors
///
/// Returns an error if the configured authorize URL is not a valid URL.
pub fn authorize_url(config: &ServerConfig) -> Result<Url, url::ParseError> {
    let scope = SPOTIFY_SCOPES.join(" ");
    Url::parse_with_params(
        &config.authorize_url,
        [
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )
}

/// Builds the frontend redirect carrying freshly issued tokens.
///
/// # Errors
///
/// Returns an error if the configured frontend URL is not a valid URL.
pub fn frontend_redirect(
    config: &ServerConfig,
    access_token: &str,
    refresh_token: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &config.frontend_redirect_uri,
        [
            ("access_token", access_token),
            ("refresh_token", refresh_token),
        ],
    )
}

/// Exchanges an authorization code for access and refresh tokens.
///
/// # Errors
///
/// Returns [`UpstreamError`] if the token endpoint is unreachable or
/// rejects the code.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &ServerConfig,
    code: &str,
) -> Result<SpotifyTokenResponse, UpstreamError> {
    let response = http
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ])
        .send()
        .await?;
    Ok(upstream::check(response).await?.json().await?)
}

/// Trades a refresh token for a new access token.
///
/// # Errors
///
/// Returns [`UpstreamError`] if the token endpoint is unreachable or
/// rejects the refresh token (`invalid_grant`).
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &ServerConfig,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, UpstreamError> {
    let response = http
        .post(&config.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ])
        .send()
        .await?;
    Ok(upstream::check(response).await?.json().await?)
}

/// `302 Found` pointing at `location`.
fn found(location: &Url) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `GET /login`: redirect to the Spotify authorization page.
pub async fn login(State(state): State<Arc<ServerState>>) -> Response {
    match authorize_url(&state.config) {
        Ok(url) => found(&url),
        Err(e) => {
            tracing::error!(error = %e, "invalid authorize url in configuration");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login unavailable").into_response()
        }
    }
}

/// Query string of the OAuth callback.
#[derive(Debug, serde::Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
}

/// `GET /callback?code=...`: exchange the code and hand tokens to the client.
pub async fn callback(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("authorization code not provided");
        return (StatusCode::BAD_REQUEST, "Authorization code not provided").into_response();
    };

    let tokens = match exchange_code(&state.http, &state.config, &code).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, details = %e.details(), "failed to exchange authorization code");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();
        }
    };
    tracing::info!("access token retrieved");

    let refresh_token = tokens.refresh_token.unwrap_or_default();
    match frontend_redirect(&state.config, &tokens.access_token, &refresh_token) {
        Ok(url) => found(&url),
        Err(e) => {
            tracing::error!(error = %e, "invalid frontend redirect in configuration");
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
        }
    }
}

/// `POST /refresh_token {refreshToken}` → `{accessToken}`.
///
/// The body is parsed leniently so that a missing or malformed body gets the
/// same 400 answer as an absent token.
pub async fn refresh(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let request: RefreshRequest = serde_json::from_slice(&body).unwrap_or_default();
    let Some(refresh_token) = request.refresh_token.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Refresh token is required")),
        )
            .into_response();
    };

    tracing::debug!("refreshing access token");
    match refresh_access_token(&state.http, &state.config, &refresh_token).await {
        Ok(tokens) => {
            tracing::info!("access token refreshed");
            Json(RefreshResponse {
                access_token: tokens.access_token,
            })
            .into_response()
        }
        Err(e) if e.oauth_error() == Some("invalid_grant") => {
            tracing::warn!("refresh token rejected by Spotify");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(
                    "Invalid refresh token. Please re-authenticate.",
                )),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to refresh access token");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to refresh access token".to_string(),
                    details: Some(e.details()),
                }),
            )
                .into_response()
        }
    }
}
