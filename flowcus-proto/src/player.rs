//! Events emitted by a playback provider.

use serde::{Deserialize, Serialize};

/// The track a player event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTrack {
    /// Spotify URI of the track.
    pub uri: String,
    /// Track title.
    pub name: String,
    /// Track length in milliseconds.
    pub duration_ms: u64,
}

/// Asynchronous notification from the playback provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// A track began playing from the start.
    TrackStarted(PlayerTrack),
    /// A track played through to its end.
    TrackEnded(PlayerTrack),
    /// The player's paused state changed.
    PauseChanged {
        /// Whether playback is now paused.
        paused: bool,
    },
}

impl PlayerEvent {
    /// Short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TrackStarted(_) => "track_started",
            Self::TrackEnded(_) => "track_ended",
            Self::PauseChanged { .. } => "pause_changed",
        }
    }
}
