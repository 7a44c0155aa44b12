//! Integration tests for the dashboard loop driving a task's song.
//!
//! Each test runs the real dashboard task over a [`LoopbackProvider`] with
//! tokio's clock paused, so the one-second countdown and notification
//! timers advance deterministically.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use flowcus::dashboard::{
    DEFAULT_CHANNEL_CAPACITY, DashboardCommand, DashboardEvent, DashboardHandle,
    DashboardSnapshot, RowState, spawn_dashboard,
};
use flowcus::playback::loopback::{LoopbackProvider, PlayerCommand};
use flowcus::playback::{Coordinator, CoordinatorConfig};
use flowcus::tasks::TaskStore;
use flowcus_proto::player::{PlayerEvent, PlayerTrack};
use flowcus_proto::task::TaskId;
use flowcus_proto::track::Track;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn track(uri: &str, name: &str, duration_ms: u64) -> Track {
    Track {
        uri: uri.to_string(),
        name: name.to_string(),
        artists_display_name: "Test Artist".to_string(),
        duration_ms,
        image: String::new(),
    }
}

fn library() -> Vec<Track> {
    vec![
        track("spotify:track:rain", "Rain Song", 180_000),
        track("spotify:track:sun", "Here Comes the Sun", 185_000),
        track("spotify:track:storm", "Riders on the Storm", 428_000),
    ]
}

fn start(provider: &Arc<LoopbackProvider>) -> DashboardHandle {
    let coordinator = Coordinator::new(
        Arc::clone(provider),
        TaskStore::new(),
        CoordinatorConfig::default(),
    );
    spawn_dashboard(coordinator, Arc::clone(provider), DEFAULT_CHANNEL_CAPACITY)
}

/// Waits (in virtual time) for the first event `pick` accepts.
async fn wait_for<T>(
    events: &mut mpsc::Receiver<DashboardEvent>,
    pick: impl Fn(DashboardEvent) -> Option<T>,
) -> T {
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            let event = events.recv().await.expect("dashboard stopped");
            if let Some(found) = pick(event) {
                return found;
            }
        }
    })
    .await
    .expect("expected dashboard event never arrived")
}

async fn wait_for_snapshot(
    events: &mut mpsc::Receiver<DashboardEvent>,
    pred: impl Fn(&DashboardSnapshot) -> bool,
) -> DashboardSnapshot {
    wait_for(events, |event| match event {
        DashboardEvent::Snapshot(s) if pred(&s) => Some(s),
        _ => None,
    })
    .await
}

/// Creates a task through the dashboard and returns its id.
async fn create(handle: &mut DashboardHandle, name: &str, track: Track) -> TaskId {
    handle
        .commands
        .send(DashboardCommand::CreateTask {
            name: name.to_string(),
            emoji: None,
            track,
        })
        .await
        .unwrap();
    let snapshot =
        wait_for_snapshot(&mut handle.events, |s| s.rows.iter().any(|r| r.task.name == name))
            .await;
    snapshot
        .rows
        .into_iter()
        .find(|r| r.task.name == name)
        .unwrap()
        .task
        .id
}

fn row_state(snapshot: &DashboardSnapshot, id: &TaskId) -> Option<RowState> {
    snapshot
        .rows
        .iter()
        .find(|r| &r.task.id == id)
        .map(|r| r.state)
}

fn player_track(track: &Track) -> PlayerTrack {
    PlayerTrack {
        uri: track.uri.clone(),
        name: track.name.clone(),
        duration_ms: track.duration_ms,
    }
}

// ===========================================================================
// Countdown and completion
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn countdown_runs_and_track_end_completes_task() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);
    let song = library()[0].clone();
    let id = create(&mut handle, "Water the plants", song.clone()).await;

    handle
        .commands
        .send(DashboardCommand::Activate(id.clone()))
        .await
        .unwrap();

    let playing = wait_for_snapshot(&mut handle.events, |s| {
        matches!(
            row_state(s, &id),
            Some(RowState::Playing { remaining_ms: 180_000, paused: false })
        )
    })
    .await;
    assert_eq!(playing.rows[0].task.id, id);
    assert_eq!(
        playing.notification.as_deref(),
        Some("Task started: \"Water the plants\"")
    );

    wait_for_snapshot(&mut handle.events, |s| {
        matches!(
            row_state(s, &id),
            Some(RowState::Playing { remaining_ms: 175_000, .. })
        )
    })
    .await;

    provider.emit(&PlayerEvent::TrackEnded(player_track(&song)));
    let done = wait_for_snapshot(&mut handle.events, |s| {
        row_state(s, &id) == Some(RowState::Completed)
    })
    .await;
    assert!(done.fade_out);

    let notified = wait_for_snapshot(&mut handle.events, |s| {
        s.notification.as_deref() == Some("Task completed: \"Water the plants\"")
    })
    .await;
    assert!(!notified.fade_out);

    handle.commands.send(DashboardCommand::Shutdown).await.unwrap();
    let store = handle.task.await.unwrap();
    assert!(store.get(&id).unwrap().completed);
}

#[tokio::test(start_paused = true)]
async fn offline_song_runs_out_and_completes_task() {
    let chime = track("spotify:track:chime", "Chime", 3_000);
    let provider = Arc::new(LoopbackProvider::with_library(vec![chime.clone()]));
    let mut handle = start(&provider);
    let id = create(&mut handle, "Tea break", chime).await;
    let started = tokio::time::Instant::now();

    handle
        .commands
        .send(DashboardCommand::Activate(id.clone()))
        .await
        .unwrap();
    let done = wait_for_snapshot(&mut handle.events, |s| {
        row_state(s, &id) == Some(RowState::Completed)
    })
    .await;

    assert!(done.fade_out);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(
        provider.commands(),
        [PlayerCommand::Play("spotify:track:chime".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn activating_playing_task_completes_it() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);
    let id = create(&mut handle, "Stretch", library()[1].clone()).await;

    for _ in 0..2 {
        handle
            .commands
            .send(DashboardCommand::Activate(id.clone()))
            .await
            .unwrap();
    }

    let done = wait_for_snapshot(&mut handle.events, |s| {
        row_state(s, &id) == Some(RowState::Completed)
    })
    .await;
    assert_eq!(done.rows.len(), 1);
    assert_eq!(
        provider.commands(),
        [
            PlayerCommand::Play("spotify:track:sun".to_string()),
            PlayerCommand::Pause,
        ]
    );
}

// ===========================================================================
// Switching
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn switching_pauses_previous_before_playing_next() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);
    let first = create(&mut handle, "Read", library()[0].clone()).await;
    let second = create(&mut handle, "Write", library()[2].clone()).await;

    handle
        .commands
        .send(DashboardCommand::Activate(first.clone()))
        .await
        .unwrap();
    wait_for_snapshot(&mut handle.events, |s| {
        matches!(row_state(s, &first), Some(RowState::Playing { .. }))
    })
    .await;

    handle
        .commands
        .send(DashboardCommand::Activate(second.clone()))
        .await
        .unwrap();
    let switched = wait_for_snapshot(&mut handle.events, |s| {
        matches!(
            row_state(s, &second),
            Some(RowState::Playing { remaining_ms: 428_000, .. })
        )
    })
    .await;

    assert_eq!(switched.rows[0].task.id, second);
    assert_eq!(row_state(&switched, &first), Some(RowState::Idle));
    assert_eq!(
        provider.commands(),
        [
            PlayerCommand::Play("spotify:track:rain".to_string()),
            PlayerCommand::Pause,
            PlayerCommand::Play("spotify:track:storm".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_pause_still_switches_after_timeout() {
    let provider = Arc::new(LoopbackProvider::new());
    let mut handle = start(&provider);
    let first = create(&mut handle, "Plan", library()[0].clone()).await;
    let second = create(&mut handle, "Do", library()[1].clone()).await;

    handle
        .commands
        .send(DashboardCommand::Activate(first.clone()))
        .await
        .unwrap();
    wait_for_snapshot(&mut handle.events, |s| {
        row_state(s, &first) == Some(RowState::Starting)
    })
    .await;

    let before = tokio::time::Instant::now();
    handle
        .commands
        .send(DashboardCommand::Activate(second.clone()))
        .await
        .unwrap();
    wait_for_snapshot(&mut handle.events, |s| {
        row_state(s, &second) == Some(RowState::Starting)
    })
    .await;

    assert!(before.elapsed() >= Duration::from_secs(2));
    assert_eq!(provider.commands().len(), 3);
}

// ===========================================================================
// Player readiness and errors
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn not_ready_player_rejects_start() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    provider.set_device(None);
    let mut handle = start(&provider);
    let id = create(&mut handle, "Call mom", library()[0].clone()).await;

    handle
        .commands
        .send(DashboardCommand::Activate(id.clone()))
        .await
        .unwrap();
    let snapshot = wait_for_snapshot(&mut handle.events, |s| {
        s.notification.as_deref() == Some("Player not ready")
    })
    .await;

    assert!(!snapshot.player_ready);
    assert_eq!(row_state(&snapshot, &id), Some(RowState::Idle));
    assert!(provider.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn expired_login_is_shown_on_the_dashboard() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);
    let id = create(&mut handle, "Pay rent", library()[0].clone()).await;
    provider.expire_session();

    handle
        .commands
        .send(DashboardCommand::Activate(id.clone()))
        .await
        .unwrap();
    let snapshot = wait_for_snapshot(&mut handle.events, |s| {
        s.notification.as_deref() == Some("Session expired, run `flowcus login`")
    })
    .await;

    assert!(snapshot.session_expired);
    assert_eq!(row_state(&snapshot, &id), Some(RowState::Idle));
}

#[tokio::test(start_paused = true)]
async fn blank_task_name_is_rejected() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);

    handle
        .commands
        .send(DashboardCommand::CreateTask {
            name: "   ".to_string(),
            emoji: None,
            track: library()[0].clone(),
        })
        .await
        .unwrap();
    let message = wait_for(&mut handle.events, |event| match event {
        DashboardEvent::TaskRejected(message) => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "task name cannot be empty");
}

// ===========================================================================
// Search and shutdown
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn search_returns_matching_tracks() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);

    handle
        .commands
        .send(DashboardCommand::Search {
            query: "SUN".to_string(),
            offset: 0,
        })
        .await
        .unwrap();
    let (query, tracks) = wait_for(&mut handle.events, |event| match event {
        DashboardEvent::SearchResults { query, tracks } => Some((query, tracks)),
        _ => None,
    })
    .await;

    assert_eq!(query, "SUN");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].uri, "spotify:track:sun");
}

#[tokio::test(start_paused = true)]
async fn shutdown_returns_tasks_and_unsubscribes() {
    let provider = Arc::new(LoopbackProvider::with_library(library()));
    let mut handle = start(&provider);
    create(&mut handle, "One", library()[0].clone()).await;
    create(&mut handle, "Two", library()[1].clone()).await;
    assert_eq!(provider.subscriber_count(), 1);

    handle.commands.send(DashboardCommand::Shutdown).await.unwrap();
    let store = handle.task.await.unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(provider.subscriber_count(), 0);
}
