//! Spotify Web API playback provider.
//!
//! Commands go to `/me/player/*` with a bearer token from the [`Session`].
//! Events are not pushed by the API; the [`super::watcher`] polls the
//! player state and publishes into the hub shared with this provider.

use std::sync::Arc;

use flowcus_proto::player::PlayerTrack;
use flowcus_proto::track::{Track, format_artists};
use parking_lot::Mutex;
use serde::Deserialize;

use super::provider::{EventHub, PlaybackProvider, PlayerEvents, ProviderError, TrackCatalog};
use super::watcher::{PlaybackSnapshot, PlaybackStateSource};
use crate::session::{Session, TokenRefresher, TokenStore, now_ms};

/// Default Spotify Web API base URL.
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Page size for track search.
pub const SEARCH_PAGE_SIZE: u32 = 10;

// ---------------------------------------------------------------------------
// Web API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    id: Option<String>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayerState {
    #[serde(default)]
    is_playing: bool,
    #[serde(default)]
    progress_ms: Option<u64>,
    item: Option<PlayerItem>,
}

#[derive(Debug, Deserialize)]
struct PlayerItem {
    uri: String,
    name: String,
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    uri: String,
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl SearchItem {
    /// Converts a search hit into a task track. The thumbnail is the
    /// smallest album image: the third when present, else the last.
    fn into_track(self) -> Track {
        let artists: Vec<String> = self.artists.into_iter().map(|a| a.name).collect();
        let image = self
            .album
            .map(|album| {
                let mut images = album.images;
                if images.len() > 2 {
                    images.swap_remove(2).url
                } else {
                    images.pop().map(|i| i.url).unwrap_or_default()
                }
            })
            .unwrap_or_default();
        Track {
            uri: self.uri,
            name: self.name,
            artists_display_name: format_artists(&artists),
            duration_ms: self.duration_ms,
            image,
        }
    }
}

/// Converts search hits into tracks, dropping repeated track ids.
fn dedup_tracks(items: Vec<SearchItem>) -> Vec<Track> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .map(SearchItem::into_track)
        .collect()
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Plays tracks through the Spotify Web API.
pub struct SpotifyProvider<S: TokenStore, R: TokenRefresher> {
    http: reqwest::Client,
    api_url: String,
    session: tokio::sync::Mutex<Session<S, R>>,
    device_id: Mutex<Option<String>>,
    hub: Arc<EventHub>,
}

impl<S: TokenStore, R: TokenRefresher> SpotifyProvider<S, R> {
    /// Creates a provider over `session`, targeting `device_id` if given.
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        session: Session<S, R>,
        device_id: Option<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            session: tokio::sync::Mutex::new(session),
            device_id: Mutex::new(device_id),
            hub: Arc::new(EventHub::new()),
        }
    }

    /// The hub the watcher should publish into.
    #[must_use]
    pub fn hub(&self) -> Arc<EventHub> {
        Arc::clone(&self.hub)
    }

    async fn bearer(&self) -> Result<String, ProviderError> {
        let mut session = self.session.lock().await;
        Ok(session.valid_access_token(now_ms()).await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// Picks a playback device when none is known.
    ///
    /// Prefers the active device, else the first one listed. Returns the
    /// chosen id. Called again whenever the device is missing, so a player
    /// opened after launch is picked up.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoDevice`] if the account has no device,
    /// or a request error.
    pub async fn discover_device(&self) -> Result<String, ProviderError> {
        if let Some(id) = self.device_id.lock().clone() {
            return Ok(id);
        }

        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.url("/me/player/devices"))
            .bearer_auth(token)
            .send()
            .await?;
        let devices: DevicesResponse = check(response).await?.json().await?;

        let chosen = devices
            .devices
            .iter()
            .find(|d| d.is_active && d.id.is_some())
            .or_else(|| devices.devices.iter().find(|d| d.id.is_some()))
            .ok_or(ProviderError::NoDevice)?;
        let id = chosen.id.clone().ok_or(ProviderError::NoDevice)?;
        tracing::info!(device_id = %id, device = %chosen.name, "playback device selected");
        *self.device_id.lock() = Some(id.clone());
        Ok(id)
    }

    async fn player_command(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), ProviderError> {
        let device_id = self.discover_device().await?;
        let token = self.bearer().await?;
        let mut request = self
            .http
            .put(self.url(path))
            .query(&[("device_id", device_id.as_str())])
            .bearer_auth(token);
        request = match body {
            Some(body) => request.json(&body),
            None => request.header(reqwest::header::CONTENT_LENGTH, 0),
        };
        match check(request.send().await?).await {
            Err(ProviderError::Status { status: 404, body }) => {
                tracing::warn!(%device_id, path, "playback device gone");
                self.forget_device(&device_id);
                Err(ProviderError::Status { status: 404, body })
            }
            other => other.map(drop),
        }
    }

    /// Drops `device_id` if it is still the selected device.
    fn forget_device(&self, device_id: &str) {
        let mut current = self.device_id.lock();
        if current.as_deref() == Some(device_id) {
            *current = None;
        }
    }
}

impl<S, R> PlaybackProvider for SpotifyProvider<S, R>
where
    S: TokenStore + 'static,
    R: TokenRefresher + 'static,
{
    fn device_id(&self) -> Option<String> {
        self.device_id.lock().clone()
    }

    async fn play(&self, uri: &str) -> Result<(), ProviderError> {
        tracing::debug!(uri, "spotify play");
        self.player_command("/me/player/play", Some(serde_json::json!({ "uris": [uri] })))
            .await
    }

    async fn pause(&self) -> Result<(), ProviderError> {
        tracing::debug!("spotify pause");
        self.player_command("/me/player/pause", None).await
    }

    fn subscribe(&self) -> PlayerEvents {
        self.hub.subscribe()
    }
}

impl<S, R> TrackCatalog for SpotifyProvider<S, R>
where
    S: TokenStore + 'static,
    R: TokenRefresher + 'static,
{
    async fn search(&self, query: &str, offset: u32) -> Result<Vec<Track>, ProviderError> {
        let token = self.bearer().await?;
        let limit = SEARCH_PAGE_SIZE.to_string();
        let offset = offset.to_string();
        let response = self
            .http
            .get(self.url("/search"))
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .bearer_auth(token)
            .send()
            .await?;
        let results: SearchResponse = check(response).await?.json().await?;
        tracing::debug!(query, hits = results.tracks.items.len(), "track search");
        Ok(dedup_tracks(results.tracks.items))
    }
}

impl<S, R> PlaybackStateSource for SpotifyProvider<S, R>
where
    S: TokenStore + 'static,
    R: TokenRefresher + 'static,
{
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, ProviderError> {
        match self.discover_device().await {
            Ok(_) | Err(ProviderError::NoDevice) => {}
            Err(e) => return Err(e),
        }
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.url("/me/player"))
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let state: PlayerState = check(response).await?.json().await?;
        Ok(state.item.map(|item| PlaybackSnapshot {
            track: PlayerTrack {
                uri: item.uri,
                name: item.name,
                duration_ms: item.duration_ms,
            },
            is_playing: state.is_playing,
            progress_ms: state.progress_ms.unwrap_or_default(),
        }))
    }
}

/// Turns an error status into [`ProviderError::Status`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
