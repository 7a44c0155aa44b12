//! Playback provider abstraction.
//!
//! Defines the [`PlaybackProvider`] trait the coordinator drives, the
//! [`TrackCatalog`] trait used for search, and [`EventHub`], which fans
//! player events out to subscribers. Concrete implementations:
//! - [`super::spotify::SpotifyProvider`]: Spotify Web API
//! - [`super::loopback::LoopbackProvider`]: in-process player for tests and
//!   offline mode

use flowcus_proto::player::PlayerEvent;
use flowcus_proto::track::Track;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::session::SessionError;

/// Stream of player events handed to one subscriber.
pub type PlayerEvents = mpsc::UnboundedReceiver<PlayerEvent>;

/// Errors from a playback provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No playback device is available.
    #[error("no playback device available")]
    NoDevice,

    /// The session has no usable access token.
    #[error("not authorized: {0}")]
    Unauthorized(#[from] SessionError),

    /// The HTTP request could not be completed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The player API answered with an error status.
    #[error("player returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
}

impl ProviderError {
    /// True when the stored tokens are gone and only a new login helps.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized(SessionError::ReauthRequired))
    }
}

/// A player that can start and pause tracks and reports what it does.
///
/// Commands return once the player accepted them; the resulting state
/// changes arrive later as [`PlayerEvent`]s on the subscribed stream.
pub trait PlaybackProvider: Send + Sync + 'static {
    /// The device playback is routed to, or `None` while not ready.
    fn device_id(&self) -> Option<String>;

    /// Starts playing `uri` from the beginning.
    fn play(
        &self,
        uri: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Pauses playback.
    fn pause(&self) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Registers a new event subscriber.
    ///
    /// Dropping the returned receiver unsubscribes.
    fn subscribe(&self) -> PlayerEvents;
}

/// Track search, used when attaching a song to a new task.
pub trait TrackCatalog: Send + Sync + 'static {
    /// Returns up to one page of tracks matching `query`, starting at
    /// `offset`.
    fn search(
        &self,
        query: &str,
        offset: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Track>, ProviderError>> + Send;
}

/// Fans player events out to every live subscriber.
///
/// Subscribers whose receiver has been dropped are pruned on the next
/// publish.
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PlayerEvent>>>,
}

impl EventHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber and returns its receiving end.
    pub fn subscribe(&self) -> PlayerEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Delivers `event` to every subscriber. Returns how many received it.
    pub fn publish(&self, event: &PlayerEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        tracing::trace!(kind = event.kind(), subscribers = subscribers.len(), "player event published");
        subscribers.len()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}
