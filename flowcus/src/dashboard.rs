//! Dashboard runtime: the single event loop that owns the coordinator.
//!
//! This module bridges the synchronous TUI loop (crossterm poll-based) with
//! the async [`Coordinator`]. One tokio task interleaves UI commands,
//! provider events, the one-second countdown tick and notification timers,
//! and publishes a [`DashboardSnapshot`] after every step.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── DashboardEvent ───  dashboard task  ←── PlayerEvent ── provider
//!                     ─── DashboardCommand →                 ─── play/pause  →
//! ```

use std::sync::Arc;
use std::time::Duration;

use flowcus_proto::quote::Quote;
use flowcus_proto::task::{Task, TaskId};
use flowcus_proto::track::Track;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::playback::{Coordinator, PlaybackPhase, PlaybackProvider, TrackCatalog};
use crate::tasks::TaskStore;

/// Default channel capacity for commands and events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Countdown tick period.
const TICK: Duration = Duration::from_secs(1);

/// Commands sent from the TUI to the dashboard task.
#[derive(Debug, Clone)]
pub enum DashboardCommand {
    /// Start the task, or complete it if it is the one playing.
    Activate(TaskId),
    /// Add a new task.
    CreateTask {
        /// Task name.
        name: String,
        /// Emoji glyph or unified code.
        emoji: Option<String>,
        /// The song to listen to.
        track: Track,
    },
    /// Search for tracks to attach to a new task.
    Search {
        /// Search text.
        query: String,
        /// Result offset for paging.
        offset: u32,
    },
    /// Close the visible notification.
    DismissNotification,
    /// Stop the dashboard.
    Shutdown,
}

/// Events sent from the dashboard task to the TUI.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// Current state of the task list and player.
    Snapshot(DashboardSnapshot),
    /// A task could not be created.
    TaskRejected(String),
    /// Search results for `query`.
    SearchResults {
        /// The query these results answer.
        query: String,
        /// Matching tracks.
        tracks: Vec<Track>,
    },
    /// A search failed.
    SearchFailed(String),
    /// The quote of the day arrived.
    Quote(Quote),
}

/// How a task row should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Not started.
    Idle,
    /// Play issued, waiting for the player.
    Starting,
    /// Song playing with the countdown running.
    Playing {
        /// Time left in milliseconds.
        remaining_ms: u64,
        /// Whether the player is paused.
        paused: bool,
    },
    /// Done.
    Completed,
}

/// One task as shown in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    /// The task.
    pub task: Task,
    /// Its display state.
    pub state: RowState,
}

/// Everything the TUI needs to draw the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSnapshot {
    /// Tasks in display order.
    pub rows: Vec<TaskRow>,
    /// The visible notification.
    pub notification: Option<String>,
    /// Set once after a task completes.
    pub fade_out: bool,
    /// Whether the player has a device.
    pub player_ready: bool,
    /// Whether the login has expired and commands will keep failing.
    pub session_expired: bool,
}

impl DashboardSnapshot {
    /// Builds a snapshot of `coordinator`, consuming its fade-out signal.
    pub fn capture<P: PlaybackProvider>(coordinator: &mut Coordinator<P>) -> Self {
        let fade_out = coordinator.take_fade_out();
        let session = coordinator.session();
        let active = session.active_task();
        let rows = coordinator
            .view()
            .into_iter()
            .map(|task| {
                let state = if task.completed {
                    RowState::Completed
                } else if Some(&task.id) != active {
                    RowState::Idle
                } else if session.phase() == PlaybackPhase::Playing {
                    RowState::Playing {
                        remaining_ms: session.remaining_ms(),
                        paused: session.is_paused(),
                    }
                } else {
                    RowState::Starting
                };
                TaskRow {
                    task: task.clone(),
                    state,
                }
            })
            .collect();

        Self {
            rows,
            notification: coordinator.notifications().visible().map(str::to_string),
            fade_out,
            player_ready: coordinator.provider().device_id().is_some(),
            session_expired: coordinator.session_expired(),
        }
    }
}

/// Channel handles for a running dashboard.
pub struct DashboardHandle {
    /// Send commands here.
    pub commands: mpsc::Sender<DashboardCommand>,
    /// Drain events from here.
    pub events: mpsc::Receiver<DashboardEvent>,
    /// Extra sender for events produced outside the loop (e.g. the quote).
    pub event_sender: mpsc::Sender<DashboardEvent>,
    /// Resolves to the final task list once the loop stops.
    pub task: JoinHandle<TaskStore>,
}

/// Spawns the dashboard loop around `coordinator`.
pub fn spawn_dashboard<P, C>(
    coordinator: Coordinator<P>,
    catalog: Arc<C>,
    capacity: usize,
) -> DashboardHandle
where
    P: PlaybackProvider,
    C: TrackCatalog,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    let (evt_tx, evt_rx) = mpsc::channel(capacity);
    let task = tokio::spawn(run(coordinator, catalog, cmd_rx, evt_tx.clone()));
    DashboardHandle {
        commands: cmd_tx,
        events: evt_rx,
        event_sender: evt_tx,
        task,
    }
}

async fn run<P, C>(
    mut coordinator: Coordinator<P>,
    catalog: Arc<C>,
    mut commands: mpsc::Receiver<DashboardCommand>,
    events: mpsc::Sender<DashboardEvent>,
) -> TaskStore
where
    P: PlaybackProvider,
    C: TrackCatalog,
{
    let mut countdown = tokio::time::interval_at(Instant::now() + TICK, TICK);
    countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut provider_open = true;

    publish(&events, DashboardSnapshot::capture(&mut coordinator));

    loop {
        let deadline = coordinator.notifications().next_deadline(Instant::now());
        let notification_timer = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            command = commands.recv() => match command {
                None | Some(DashboardCommand::Shutdown) => break,
                Some(command) => handle_command(&mut coordinator, &catalog, &events, command).await,
            },
            event = coordinator.next_event(), if provider_open => match event {
                Some(event) => coordinator.handle_event(event),
                None => {
                    tracing::warn!("player event stream closed");
                    provider_open = false;
                }
            },
            _ = countdown.tick() => coordinator.tick(),
            () = notification_timer => {}
        }

        coordinator.poll_notifications(Instant::now());
        publish(&events, DashboardSnapshot::capture(&mut coordinator));
    }

    tracing::info!("dashboard stopped");
    coordinator.detach()
}

async fn handle_command<P, C>(
    coordinator: &mut Coordinator<P>,
    catalog: &Arc<C>,
    events: &mpsc::Sender<DashboardEvent>,
    command: DashboardCommand,
) where
    P: PlaybackProvider,
    C: TrackCatalog,
{
    match command {
        DashboardCommand::Activate(id) => {
            match coordinator.request_toggle_or_complete(&id).await {
                Ok(outcome) => tracing::debug!(task_id = %id, ?outcome, "task action"),
                Err(e) => tracing::warn!(task_id = %id, error = %e, "task action rejected"),
            }
        }
        DashboardCommand::CreateTask { name, emoji, track } => {
            if let Err(e) = coordinator.create_task(&name, emoji.as_deref(), track) {
                let _ = events.send(DashboardEvent::TaskRejected(e.to_string())).await;
            }
        }
        DashboardCommand::Search { query, offset } => {
            let catalog = Arc::clone(catalog);
            let events = events.clone();
            tokio::spawn(async move {
                let event = match catalog.search(&query, offset).await {
                    Ok(tracks) => DashboardEvent::SearchResults { query, tracks },
                    Err(e) => {
                        tracing::warn!(query, error = %e, "track search failed");
                        DashboardEvent::SearchFailed(e.to_string())
                    }
                };
                let _ = events.send(event).await;
            });
        }
        DashboardCommand::DismissNotification => coordinator.dismiss_notification(),
        DashboardCommand::Shutdown => {}
    }
}

/// Snapshots supersede each other, so a full channel just drops one.
fn publish(events: &mpsc::Sender<DashboardEvent>, snapshot: DashboardSnapshot) {
    if let Err(mpsc::error::TrySendError::Full(_)) =
        events.try_send(DashboardEvent::Snapshot(snapshot))
    {
        tracing::trace!("event channel full, snapshot skipped");
    }
}
