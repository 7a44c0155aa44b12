//! OAuth token payloads shared by the backend and the client.

use serde::{Deserialize, Serialize};

/// Lifetime Spotify grants an access token, in milliseconds.
pub const ACCESS_TOKEN_LIFETIME_MS: u64 = 3600 * 1000;

/// Body of `POST /refresh_token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token obtained during login.
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
}

/// Successful response of `POST /refresh_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Newly issued access token.
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// JSON error body returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Upstream detail, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Creates an error body without details.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

/// Token response from the Spotify accounts service.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token; only present on the authorization-code grant.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Tokens persisted by the client between runs.
///
/// Field names are fixed so a session file written by one version stays
/// readable by the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    /// Current access token.
    #[serde(rename = "spotifyAccessToken", default)]
    pub access_token: Option<String>,
    /// Refresh token obtained at login.
    #[serde(rename = "spotifyRefreshToken", default)]
    pub refresh_token: Option<String>,
    /// Access token expiry in milliseconds since the Unix epoch.
    #[serde(rename = "spotifyAccessTokenExpiry", default)]
    pub expires_at_ms: Option<u64>,
}
