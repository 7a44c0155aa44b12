//! Player-state polling.
//!
//! The Web API has no push channel, so player events are derived by
//! polling the playback state and comparing consecutive snapshots.

use std::sync::Arc;
use std::time::Duration;

use flowcus_proto::player::{PlayerEvent, PlayerTrack};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::provider::{EventHub, ProviderError};

/// What the player is doing at one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// The current track.
    pub track: PlayerTrack,
    /// Whether it is playing (as opposed to paused).
    pub is_playing: bool,
    /// Position within the track.
    pub progress_ms: u64,
}

/// Something that reports the current player state.
pub trait PlaybackStateSource: Send + Sync + 'static {
    /// Current state, or `None` when nothing is loaded.
    fn current_playback(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<PlaybackSnapshot>, ProviderError>> + Send;
}

/// Converts two consecutive snapshots into player events.
///
/// Events are ordered end, start, pause change. `end_tolerance_ms` is how
/// close to its end a playing track must have been for its disappearance to
/// count as finishing.
#[must_use]
pub fn derive_events(
    prev: Option<&PlaybackSnapshot>,
    next: Option<&PlaybackSnapshot>,
    end_tolerance_ms: u64,
) -> Vec<PlayerEvent> {
    let mut events = Vec::new();

    if let Some(p) = prev
        && p.is_playing
        && p.track.duration_ms.saturating_sub(p.progress_ms) <= end_tolerance_ms
    {
        let finished = next.is_none_or(|n| {
            n.track.uri != p.track.uri || n.progress_ms < p.progress_ms
        });
        if finished {
            events.push(PlayerEvent::TrackEnded(p.track.clone()));
        }
    }

    if let Some(n) = next
        && n.is_playing
    {
        let started = prev.is_none_or(|p| {
            // A backward seek within the track is not a restart.
            p.track.uri != n.track.uri
                || (n.progress_ms <= end_tolerance_ms
                    && (n.progress_ms < p.progress_ms || !p.is_playing))
        });
        if started {
            events.push(PlayerEvent::TrackStarted(n.track.clone()));
        }
    }

    let was_paused = prev.is_none_or(|p| !p.is_playing);
    let is_paused = next.is_none_or(|n| !n.is_playing);
    if was_paused != is_paused {
        events.push(PlayerEvent::PauseChanged { paused: is_paused });
    }

    events
}

/// Spawns a task that polls `source` every `interval` and publishes the
/// derived events into `hub`.
///
/// Poll failures are logged and the previous snapshot is kept. Abort the
/// returned handle to stop polling.
pub fn spawn_watcher<S: PlaybackStateSource>(
    source: Arc<S>,
    hub: Arc<EventHub>,
    interval: Duration,
    end_tolerance_ms: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut prev: Option<PlaybackSnapshot> = None;
        let mut failing = false;

        loop {
            ticker.tick().await;
            let next = match source.current_playback().await {
                Ok(next) => {
                    if failing {
                        tracing::info!("player state polling recovered");
                        failing = false;
                    }
                    next
                }
                Err(e) => {
                    if failing {
                        tracing::debug!(error = %e, "player state poll failed");
                    } else {
                        tracing::warn!(error = %e, "player state poll failed");
                        failing = true;
                    }
                    continue;
                }
            };

            for event in derive_events(prev.as_ref(), next.as_ref(), end_tolerance_ms) {
                hub.publish(&event);
            }
            prev = next;
        }
    })
}
