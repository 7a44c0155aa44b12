//! Daily quote proxy with a single-entry, date-keyed cache.
//!
//! The upstream service is asked at most once per UTC calendar day. The
//! cache lock is held across the fetch, so concurrent first requests of
//! the day share one upstream call. Failures are never cached.

use std::future::Future;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use flowcus_proto::auth::ErrorBody;
use flowcus_proto::quote::{Quote, ZenQuote};
use tokio::sync::Mutex;

use crate::server::ServerState;
use crate::upstream::{self, UpstreamError};

/// Errors from fetching the quote of the day.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    /// The upstream answered with an empty list.
    #[error("no quote found")]
    NotFound,
    /// The upstream could not be reached or failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// A quote and the day it was fetched for.
#[derive(Debug, Clone)]
struct CachedQuote {
    date: NaiveDate,
    quote: Quote,
}

/// Holds at most one quote, valid for the day it was fetched.
#[derive(Debug, Default)]
pub struct QuoteCache {
    entry: Mutex<Option<CachedQuote>>,
}

impl QuoteCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached quote for `today`, or runs `fetch` and caches its
    /// result.
    ///
    /// # Errors
    ///
    /// Propagates the error from `fetch`; nothing is cached in that case.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        today: NaiveDate,
        fetch: F,
    ) -> Result<Quote, QuoteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Quote, QuoteError>>,
    {
        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref().filter(|c| c.date == today) {
            tracing::debug!(date = %today, "serving cached quote");
            return Ok(cached.quote.clone());
        }

        let quote = fetch().await?;
        tracing::info!(date = %today, author = %quote.author, "fetched quote of the day");
        *entry = Some(CachedQuote {
            date: today,
            quote: quote.clone(),
        });
        drop(entry);
        Ok(quote)
    }
}

/// Fetches today's quote from a ZenQuotes-compatible endpoint.
///
/// # Errors
///
/// Returns [`QuoteError::NotFound`] for an empty response and
/// [`QuoteError::Upstream`] for transport or status failures.
pub async fn fetch_today(http: &reqwest::Client, url: &str) -> Result<Quote, QuoteError> {
    let response = http.get(url).send().await.map_err(UpstreamError::from)?;
    let response = upstream::check(response).await?;
    let entries: Vec<ZenQuote> = response.json().await.map_err(UpstreamError::from)?;
    entries
        .into_iter()
        .next()
        .map(Quote::from)
        .ok_or(QuoteError::NotFound)
}

/// `GET /api/today` → `{quote, author}`.
pub async fn today(State(state): State<Arc<ServerState>>) -> Response {
    let date = Utc::now().date_naive();
    let result = state
        .quotes
        .get_or_fetch(date, || fetch_today(&state.http, &state.config.quote_url))
        .await;

    match result {
        Ok(quote) => Json(quote).into_response(),
        Err(QuoteError::NotFound) => {
            tracing::warn!("quote service returned no quote");
            (StatusCode::NOT_FOUND, Json(ErrorBody::new("No quote found"))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "error fetching quote");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Failed to fetch quote")),
            )
                .into_response()
        }
    }
}
