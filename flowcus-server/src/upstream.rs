//! Errors and response checks for calls to third-party APIs.

use serde_json::Value;

/// Failure talking to Spotify or the quote service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The request could not be sent or the body could not be read.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Parsed JSON body, or the raw text as a JSON string.
        body: Value,
    },
}

impl UpstreamError {
    /// The OAuth `error` code in the upstream body, if any (e.g. `invalid_grant`).
    #[must_use]
    pub fn oauth_error(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body.get("error").and_then(Value::as_str),
            Self::Http(_) => None,
        }
    }

    /// Detail value suitable for an error response body.
    #[must_use]
    pub fn details(&self) -> Value {
        match self {
            Self::Status { body, .. } => body.clone(),
            Self::Http(e) => Value::String(e.to_string()),
        }
    }
}

/// Passes successful responses through and turns the rest into
/// [`UpstreamError::Status`].
///
/// # Errors
///
/// Returns [`UpstreamError::Status`] for non-2xx responses.
pub async fn check(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}
