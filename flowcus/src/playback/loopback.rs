//! In-process player for tests and offline mode.
//!
//! [`LoopbackProvider`] records every command it receives and, when
//! auto-confirm is on, answers them with the events a real player would
//! emit, including the end of a library track once its duration has
//! passed. Tests can also inject events and command failures directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use flowcus_proto::player::{PlayerEvent, PlayerTrack};
use flowcus_proto::track::Track;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::provider::{EventHub, PlaybackProvider, PlayerEvents, ProviderError, TrackCatalog};
use crate::session::SessionError;

/// Device id reported by a ready loopback player.
pub const LOOPBACK_DEVICE_ID: &str = "loopback";

/// A command received by the loopback player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// `play(uri)`.
    Play(String),
    /// `pause()`.
    Pause,
}

/// Player backed by an [`EventHub`] and a command log.
#[derive(Debug)]
pub struct LoopbackProvider {
    hub: Arc<EventHub>,
    device_id: Mutex<Option<String>>,
    commands: Mutex<Vec<PlayerCommand>>,
    library: Vec<Track>,
    /// Publishes `TrackEnded` for the track currently playing.
    pending_end: Mutex<Option<JoinHandle<()>>>,
    auto_confirm: AtomicBool,
    fail_next_play: AtomicBool,
    fail_next_pause: AtomicBool,
    session_expired: AtomicBool,
}

impl Default for LoopbackProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackProvider {
    /// A ready player that does not emit events on its own.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: Arc::new(EventHub::new()),
            device_id: Mutex::new(Some(LOOPBACK_DEVICE_ID.to_string())),
            commands: Mutex::new(Vec::new()),
            library: Vec::new(),
            pending_end: Mutex::new(None),
            auto_confirm: AtomicBool::new(false),
            fail_next_play: AtomicBool::new(false),
            fail_next_pause: AtomicBool::new(false),
            session_expired: AtomicBool::new(false),
        }
    }

    /// A ready player that confirms commands with events and serves
    /// `library` for search.
    #[must_use]
    pub fn with_library(library: Vec<Track>) -> Self {
        let mut provider = Self::new();
        provider.library = library;
        provider.set_auto_confirm(true);
        provider
    }

    /// Sets or clears the device id. `None` makes the player not ready.
    pub fn set_device(&self, device_id: Option<&str>) {
        *self.device_id.lock() = device_id.map(str::to_string);
    }

    /// Whether commands are answered with matching events.
    pub fn set_auto_confirm(&self, enabled: bool) {
        self.auto_confirm.store(enabled, Ordering::SeqCst);
    }

    /// Makes the next `play` call fail.
    pub fn fail_next_play(&self) {
        self.fail_next_play.store(true, Ordering::SeqCst);
    }

    /// Makes the next `pause` call fail.
    pub fn fail_next_pause(&self) {
        self.fail_next_pause.store(true, Ordering::SeqCst);
    }

    /// Makes every later command fail as if the login had been revoked.
    pub fn expire_session(&self) {
        self.session_expired.store(true, Ordering::SeqCst);
    }

    /// Commands received so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.commands.lock().clone()
    }

    /// Publishes `event` as if the player had emitted it.
    pub fn emit(&self, event: &PlayerEvent) -> usize {
        self.hub.publish(event)
    }

    /// Number of live event subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn injected_failure(&self, flag: &AtomicBool) -> Result<(), ProviderError> {
        if self.session_expired.load(Ordering::SeqCst) {
            return Err(ProviderError::Unauthorized(SessionError::ReauthRequired));
        }
        if flag.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::Status {
                status: 502,
                body: "loopback failure".to_string(),
            });
        }
        Ok(())
    }

    /// Cancels the scheduled end of the current track, if any.
    fn cancel_pending_end(&self) {
        if let Some(handle) = self.pending_end.lock().take() {
            handle.abort();
        }
    }

    /// Publishes `TrackEnded` for `track` once its duration has passed.
    fn schedule_end(&self, track: PlayerTrack) {
        let hub = Arc::clone(&self.hub);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(track.duration_ms)).await;
            tracing::debug!(uri = %track.uri, "loopback track finished");
            hub.publish(&PlayerEvent::TrackEnded(track));
        });
        if let Some(previous) = self.pending_end.lock().replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for LoopbackProvider {
    fn drop(&mut self) {
        self.cancel_pending_end();
    }
}

impl PlaybackProvider for LoopbackProvider {
    fn device_id(&self) -> Option<String> {
        self.device_id.lock().clone()
    }

    async fn play(&self, uri: &str) -> Result<(), ProviderError> {
        self.commands.lock().push(PlayerCommand::Play(uri.to_string()));
        self.injected_failure(&self.fail_next_play)?;
        self.cancel_pending_end();

        if self.auto_confirm.load(Ordering::SeqCst) {
            self.hub.publish(&PlayerEvent::PauseChanged { paused: false });
            if let Some(track) = self.library.iter().find(|t| t.uri == uri) {
                let track = PlayerTrack {
                    uri: track.uri.clone(),
                    name: track.name.clone(),
                    duration_ms: track.duration_ms,
                };
                self.hub.publish(&PlayerEvent::TrackStarted(track.clone()));
                self.schedule_end(track);
            }
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), ProviderError> {
        self.commands.lock().push(PlayerCommand::Pause);
        self.injected_failure(&self.fail_next_pause)?;
        self.cancel_pending_end();

        if self.auto_confirm.load(Ordering::SeqCst) {
            self.hub.publish(&PlayerEvent::PauseChanged { paused: true });
        }
        Ok(())
    }

    fn subscribe(&self) -> PlayerEvents {
        self.hub.subscribe()
    }
}

impl TrackCatalog for LoopbackProvider {
    async fn search(&self, query: &str, offset: u32) -> Result<Vec<Track>, ProviderError> {
        let needle = query.trim().to_lowercase();
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(self
            .library
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&needle)
                    || t.artists_display_name.to_lowercase().contains(&needle)
            })
            .skip(offset)
            .take(10)
            .cloned()
            .collect())
    }
}
