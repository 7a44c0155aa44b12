//! Playback coordinator: ties the task list to the player.
//!
//! The [`Coordinator`] owns the task store, the notification queue and the
//! playback session state. It decides whether a request starts, switches
//! or completes a task, issues the matching provider commands, and reacts
//! to the events the provider reports. It is owned by a single event loop,
//! so none of its state needs locking.

use std::sync::Arc;
use std::time::Duration;

use flowcus_proto::player::PlayerEvent;
use flowcus_proto::task::{Task, TaskId};
use flowcus_proto::track::Track;
use tokio::time::Instant;

use super::PlaybackError;
use super::collapse::{CollapseWindow, DEFAULT_COLLAPSE_WINDOW};
use super::provider::{PlaybackProvider, PlayerEvents, ProviderError};
use crate::notify::NotificationQueue;
use crate::tasks::{TaskError, TaskStore};

/// Countdown decrement applied by each [`Coordinator::tick`].
pub const TICK_MS: u64 = 1000;

/// Shown when a command fails because the login is no longer valid.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, run `flowcus login`";

/// Timing knobs for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long to wait for the player to confirm a pause before switching.
    pub pause_confirm_timeout: Duration,
    /// Width of the duplicate-event collapse window.
    pub collapse_window: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            pause_confirm_timeout: Duration::from_secs(2),
            collapse_window: DEFAULT_COLLAPSE_WINDOW,
        }
    }
}

/// Where the active task is in its playback lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No task is playing.
    #[default]
    Idle,
    /// Play was issued; waiting for the player to report the track.
    Starting,
    /// The player reported the track; the countdown is running.
    Playing,
}

/// Playback state for the active task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSession {
    active_task: Option<TaskId>,
    phase: PlaybackPhase,
    is_paused: bool,
    remaining_ms: u64,
}

impl PlaybackSession {
    /// The task whose song is playing, if any.
    #[must_use]
    pub const fn active_task(&self) -> Option<&TaskId> {
        self.active_task.as_ref()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Whether the player last reported itself paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Milliseconds left on the countdown.
    #[must_use]
    pub const fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    fn reset(&mut self) {
        self.active_task = None;
        self.phase = PlaybackPhase::Idle;
        self.remaining_ms = 0;
    }
}

/// Result of a successful coordinator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The task's song was started.
    Started,
    /// The task was already active; nothing was done.
    AlreadyActive,
    /// The active task was completed.
    Completed,
}

/// Bridges the task store to a [`PlaybackProvider`].
pub struct Coordinator<P: PlaybackProvider> {
    provider: Arc<P>,
    events: PlayerEvents,
    tasks: TaskStore,
    notifications: NotificationQueue,
    session: PlaybackSession,
    started: CollapseWindow,
    ended: CollapseWindow,
    config: CoordinatorConfig,
    fade_out: bool,
    session_expired: bool,
}

impl<P: PlaybackProvider> Coordinator<P> {
    /// Creates a coordinator and subscribes to the provider's events.
    pub fn new(provider: Arc<P>, tasks: TaskStore, config: CoordinatorConfig) -> Self {
        let events = provider.subscribe();
        Self {
            provider,
            events,
            tasks,
            notifications: NotificationQueue::new(),
            session: PlaybackSession::default(),
            started: CollapseWindow::new(config.collapse_window),
            ended: CollapseWindow::new(config.collapse_window),
            config,
            fade_out: false,
            session_expired: false,
        }
    }

    /// The task store.
    #[must_use]
    pub const fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Playback state of the active task.
    #[must_use]
    pub const fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// The notification queue.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    /// Whether a command failed because the user has to log in again.
    #[must_use]
    pub const fn session_expired(&self) -> bool {
        self.session_expired
    }

    /// The provider this coordinator drives.
    #[must_use]
    pub const fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// The active task, if any.
    #[must_use]
    pub fn active_task(&self) -> Option<&Task> {
        self.session.active_task().and_then(|id| self.tasks.get(id))
    }

    /// Tasks in display order.
    #[must_use]
    pub fn view(&self) -> Vec<&Task> {
        self.tasks.view(self.session.active_task())
    }

    /// Adds a task to the store.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] if the name is blank or too long.
    pub fn create_task(
        &mut self,
        name: &str,
        emoji: Option<&str>,
        track: Track,
    ) -> Result<Task, TaskError> {
        self.tasks.create_task(name, emoji, track)
    }

    /// Starts the song of task `id`, pausing the active task first.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::TaskNotFound`] or
    /// [`PlaybackError::TaskCompleted`] for tasks that cannot be started,
    /// [`PlaybackError::ProviderUnavailable`] while the player has no
    /// device, and [`PlaybackError::Provider`] if a command fails.
    pub async fn request_start(&mut self, id: &TaskId) -> Result<Outcome, PlaybackError> {
        let task = self
            .tasks
            .get(id)
            .ok_or_else(|| PlaybackError::TaskNotFound(id.to_string()))?;
        if task.completed {
            return Err(PlaybackError::TaskCompleted(id.to_string()));
        }
        if self.session.active_task() == Some(id) {
            return Ok(Outcome::AlreadyActive);
        }
        let name = task.name.clone();
        let uri = task.track.uri.clone();

        if self.provider.device_id().is_none() {
            tracing::warn!(task_id = %id, "player not ready, start rejected");
            self.notify("Player not ready");
            return Err(PlaybackError::ProviderUnavailable);
        }

        self.release_active().await?;

        if let Err(e) = self.provider.play(&uri).await {
            tracing::warn!(task_id = %id, uri = %uri, error = %e, "failed to start playback");
            self.report_failure(&e, format!("Could not start \"{name}\""));
            return Err(e.into());
        }

        self.session.active_task = Some(id.clone());
        self.session.phase = PlaybackPhase::Starting;
        self.session.is_paused = false;
        self.session.remaining_ms = 0;
        tracing::info!(task_id = %id, uri = %uri, "task started");
        self.notify(format!("Task started: \"{name}\""));
        Ok(Outcome::Started)
    }

    /// Completes task `id` if it is active, otherwise starts it.
    ///
    /// # Errors
    ///
    /// Same as [`request_start`](Self::request_start) when `id` is not the
    /// active task. Completing the active task never fails: a failed pause
    /// is logged and completion proceeds.
    pub async fn request_toggle_or_complete(
        &mut self,
        id: &TaskId,
    ) -> Result<Outcome, PlaybackError> {
        if self.session.active_task() != Some(id) {
            return self.request_start(id).await;
        }

        if let Err(e) = self.provider.pause().await {
            tracing::warn!(task_id = %id, error = %e, "pause before completion failed");
            if e.requires_login() {
                self.mark_session_expired();
            }
        }
        self.complete_active();
        Ok(Outcome::Completed)
    }

    /// Waits for the next provider event.
    ///
    /// Returns `None` once the provider has dropped the stream.
    pub async fn next_event(&mut self) -> Option<PlayerEvent> {
        self.events.recv().await
    }

    /// Applies a provider event received now.
    pub fn handle_event(&mut self, event: PlayerEvent) {
        self.handle_event_at(event, Instant::now());
    }

    /// Applies a provider event received at `now`.
    pub fn handle_event_at(&mut self, event: PlayerEvent, now: Instant) {
        tracing::debug!(kind = event.kind(), "player event");
        match event {
            PlayerEvent::TrackStarted(track) => {
                if !self.started.admit(&track.uri, now) {
                    tracing::trace!(uri = %track.uri, "duplicate track start collapsed");
                    return;
                }
                let Some(duration_ms) = self
                    .active_task()
                    .filter(|t| !t.completed && t.track.uri == track.uri)
                    .map(|t| t.track.duration_ms)
                else {
                    return;
                };
                self.session.remaining_ms = duration_ms;
                self.session.phase = PlaybackPhase::Playing;
            }
            PlayerEvent::TrackEnded(track) => {
                if !self.ended.admit(&track.uri, now) {
                    tracing::trace!(uri = %track.uri, "duplicate track end collapsed");
                    return;
                }
                if self.active_task().is_some_and(|t| t.track.uri == track.uri) {
                    self.complete_active();
                }
            }
            PlayerEvent::PauseChanged { paused } => {
                self.session.is_paused = paused;
            }
        }
    }

    /// Advances the countdown by one second.
    pub const fn tick(&mut self) {
        if self.session.active_task.is_some() && self.session.remaining_ms > 0 {
            self.session.remaining_ms = self.session.remaining_ms.saturating_sub(TICK_MS);
        }
    }

    /// Consumes the fade-out signal raised by a completion.
    pub const fn take_fade_out(&mut self) -> bool {
        std::mem::replace(&mut self.fade_out, false)
    }

    /// Advances notification timers and returns the visible message.
    pub fn poll_notifications(&mut self, now: Instant) -> Option<&str> {
        self.notifications.poll(now)
    }

    /// Closes the visible notification.
    pub fn dismiss_notification(&mut self) {
        self.notifications.dismiss(Instant::now());
    }

    /// Drops the event subscription and returns the task store.
    pub fn detach(self) -> TaskStore {
        tracing::debug!("coordinator detached from provider");
        self.tasks
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.notifications.enqueue(message, Instant::now());
    }

    /// Notifies about a failed command; an expired login gets its own message.
    fn report_failure(&mut self, error: &ProviderError, message: String) {
        if error.requires_login() {
            self.mark_session_expired();
        } else {
            self.notify(message);
        }
    }

    fn mark_session_expired(&mut self) {
        tracing::warn!("login expired, commands will fail until the user logs in again");
        self.session_expired = true;
        self.notify(SESSION_EXPIRED_MESSAGE);
    }

    /// Applies events that are already queued without waiting for more.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn complete_active(&mut self) {
        let Some(id) = self.session.active_task.clone() else {
            return;
        };
        self.session.reset();
        if !self.tasks.complete_task(&id) {
            return;
        }
        let name = self
            .tasks
            .get(&id)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        tracing::info!(task_id = %id, "task completed");
        self.notify(format!("Task completed: \"{name}\""));
        self.fade_out = true;
    }

    /// Pauses the active task and clears it so another can start.
    async fn release_active(&mut self) -> Result<(), PlaybackError> {
        // A confirmation already queued predates the pause issued below.
        self.drain_events();
        let Some(previous) = self.session.active_task.clone() else {
            return Ok(());
        };

        if !self.session.is_paused {
            let name = self
                .tasks
                .get(&previous)
                .map(|t| t.name.clone())
                .unwrap_or_default();
            if let Err(e) = self.provider.pause().await {
                tracing::warn!(task_id = %previous, error = %e, "failed to pause active task");
                self.report_failure(&e, format!("Could not pause \"{name}\""));
                return Err(e.into());
            }
            self.notify(format!("Task paused: \"{name}\""));
            self.await_pause_confirmation().await;
        }

        if self.session.active_task() == Some(&previous) {
            self.session.reset();
        }
        Ok(())
    }

    /// Waits for the player to report that it paused, bounded by the
    /// configured timeout. Events that arrive meanwhile are applied.
    async fn await_pause_confirmation(&mut self) {
        let timeout = self.config.pause_confirm_timeout;
        match tokio::time::timeout(timeout, self.wait_for_pause()).await {
            Ok(true) => tracing::debug!("pause confirmed"),
            Ok(false) => tracing::warn!("player event stream closed while awaiting pause"),
            Err(_) => tracing::warn!(
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "pause not confirmed in time, switching anyway"
            ),
        }
    }

    async fn wait_for_pause(&mut self) -> bool {
        while let Some(event) = self.events.recv().await {
            let confirmed = event == PlayerEvent::PauseChanged { paused: true };
            self.handle_event(event);
            if confirmed {
                return true;
            }
        }
        false
    }
}
