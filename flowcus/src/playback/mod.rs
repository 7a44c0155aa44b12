//! Playback: the coordinator that ties tasks to songs, and the providers
//! it drives.

pub mod collapse;
pub mod coordinator;
pub mod loopback;
pub mod provider;
pub mod spotify;
pub mod watcher;

pub use coordinator::{Coordinator, CoordinatorConfig, Outcome, PlaybackPhase, PlaybackSession};
pub use provider::{EventHub, PlaybackProvider, PlayerEvents, ProviderError, TrackCatalog};

/// Errors returned by coordinator requests.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// No task with this id exists.
    #[error("task {0} not found")]
    TaskNotFound(String),

    /// The task is already completed and cannot be started.
    #[error("task {0} is already completed")]
    TaskCompleted(String),

    /// The provider has no playback device yet.
    #[error("player not ready")]
    ProviderUnavailable,

    /// The provider rejected a play or pause command.
    #[error("playback command failed: {0}")]
    Provider(#[from] ProviderError),
}
