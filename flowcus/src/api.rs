//! HTTP client for the Flowcus backend.
//!
//! Covers the two routes the dashboard calls at runtime: token refresh and
//! the quote of the day. Login itself happens in the browser.

use flowcus_proto::auth::{ErrorBody, RefreshRequest, RefreshResponse};
use flowcus_proto::quote::Quote;

use crate::session::TokenRefresher;

/// Errors from backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the response not decoded.
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("backend returned {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response body, or the raw body.
        message: String,
    },
}

/// Client for the `flowcus-server` routes.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client that reuses `http`.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// URL the user opens in a browser to log in.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    /// Fetches the quote of the day.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the backend is unreachable or answers with
    /// an error.
    pub async fn daily_quote(&self) -> Result<Quote, ApiError> {
        let response = self
            .http
            .get(format!("{}/api/today", self.base_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

impl TokenRefresher for BackendClient {
    async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(format!("{}/refresh_token", self.base_url))
            .json(&RefreshRequest {
                refresh_token: Some(refresh_token.to_string()),
            })
            .send()
            .await?;
        let body: RefreshResponse = check(response).await?.json().await?;
        Ok(body.access_token)
    }
}

/// Turns an error status into [`ApiError::Rejected`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text).map_or(text, |body| body.error);
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}
