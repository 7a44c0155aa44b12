//! `flowcus`: terminal dashboard for song-timed tasks.
//!
//! Launches the TUI against Spotify, or against a built-in player with
//! `--offline`. Configuration via CLI flags, environment variables, or
//! config file (`~/.config/flowcus/config.toml`).
//!
//! ```bash
//! # Log in once (needs flowcus-server running)
//! cargo run --bin flowcus -- login
//!
//! # Dashboard
//! cargo run --bin flowcus
//!
//! # Try it without Spotify
//! cargo run --bin flowcus -- --offline
//! ```

use std::error::Error;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use flowcus_proto::track::Track;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use flowcus::api::BackendClient;
use flowcus::app::App;
use flowcus::config::{CliArgs, ClientConfig, Command};
use flowcus::dashboard::{
    DEFAULT_CHANNEL_CAPACITY, DashboardCommand, DashboardEvent, DashboardHandle, spawn_dashboard,
};
use flowcus::login;
use flowcus::playback::loopback::LoopbackProvider;
use flowcus::playback::spotify::SpotifyProvider;
use flowcus::playback::watcher::spawn_watcher;
use flowcus::playback::{Coordinator, PlaybackProvider, TrackCatalog};
use flowcus::session::{FileTokenStore, Session, TokenStore, now_ms};
use flowcus::tasks::TaskStore;
use flowcus::ui;

/// How long shutdown waits for the dashboard loop to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!(api_url = %config.api_url, offline = cli.offline, "flowcus starting");

    let outcome = match cli.command {
        Some(Command::Login) => run_login(&config).await,
        Some(Command::Logout) => run_logout(),
        None if cli.offline => run_offline(&config).await,
        None => run_online(&config).await,
    };

    if let Err(e) = outcome {
        tracing::error!(error = %e, "flowcus failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    tracing::info!("flowcus exiting");
    Ok(())
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("flowcus.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn token_store() -> Result<FileTokenStore, Box<dyn Error>> {
    FileTokenStore::default_path()
        .map(FileTokenStore::new)
        .ok_or_else(|| "could not determine config directory".into())
}

/// `flowcus login`: capture tokens from the backend's redirect.
async fn run_login(config: &ClientConfig) -> Result<(), Box<dyn Error>> {
    let backend = BackendClient::new(&config.api_url);
    let mut session = Session::load(token_store()?, backend.clone())?;
    let (addr, pending) = login::start_capture(&config.redirect_bind).await?;

    println!("Open this URL in your browser to log in with Spotify:\n");
    println!("    {}\n", backend.login_url());
    println!("Waiting for the redirect on http://{addr}/callback ...");

    let tokens = pending.wait().await?;
    session.store_initial(&tokens.access_token, &tokens.refresh_token, now_ms())?;
    println!("Logged in. Run `flowcus` to open your tasks.");
    Ok(())
}

/// `flowcus logout`: forget stored tokens.
fn run_logout() -> Result<(), Box<dyn Error>> {
    token_store()?.clear()?;
    tracing::info!("session cleared");
    println!("Logged out.");
    Ok(())
}

/// Dashboard against Spotify.
async fn run_online(config: &ClientConfig) -> Result<(), Box<dyn Error>> {
    let backend = BackendClient::new(&config.api_url);
    let session = Session::load(token_store()?, backend.clone())?;
    if !session.is_authenticated() {
        return Err("not logged in; run `flowcus login` first".into());
    }

    let provider = Arc::new(SpotifyProvider::new(
        reqwest::Client::new(),
        &config.spotify_api_url,
        session,
        config.device_id.clone(),
    ));
    if let Err(e) = provider.discover_device().await {
        tracing::warn!(error = %e, "no playback device yet");
    }
    let watcher = spawn_watcher(
        Arc::clone(&provider),
        provider.hub(),
        config.poll_interval,
        config.end_tolerance_ms,
    );

    let result = run_dashboard(Arc::clone(&provider), provider, config, backend, false).await;
    watcher.abort();
    result
}

/// Dashboard against the built-in player.
async fn run_offline(config: &ClientConfig) -> Result<(), Box<dyn Error>> {
    let provider = Arc::new(LoopbackProvider::with_library(demo_library()));
    let backend = BackendClient::new(&config.api_url);
    run_dashboard(Arc::clone(&provider), provider, config, backend, true).await
}

/// Sets up the terminal, runs the UI loop, and restores the terminal.
async fn run_dashboard<P, C>(
    provider: Arc<P>,
    catalog: Arc<C>,
    config: &ClientConfig,
    backend: BackendClient,
    offline: bool,
) -> Result<(), Box<dyn Error>>
where
    P: PlaybackProvider,
    C: TrackCatalog,
{
    let coordinator = Coordinator::new(provider, TaskStore::new(), config.coordinator());
    let handle = spawn_dashboard(coordinator, catalog, DEFAULT_CHANNEL_CAPACITY);
    spawn_quote_fetch(backend, handle.event_sender.clone());

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, handle, config, offline).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(result?)
}

/// Main UI loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: DashboardHandle,
    config: &ClientConfig,
    offline: bool,
) -> io::Result<()> {
    let DashboardHandle {
        commands,
        mut events,
        task,
        ..
    } = handle;
    let mut app = App::new(offline);

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending dashboard events (non-blocking).
        drain_events(&mut app, &mut events);
        app.on_frame();

        // Step 3: Poll for terminal input events.
        if event::poll(config.ui_poll)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(command) = app.handle_key_event(key)
                && let Err(e) = commands.try_send(command)
            {
                tracing::warn!(error = %e, "dashboard command dropped");
            }
        }

        if app.should_quit {
            let _ = commands.try_send(DashboardCommand::Shutdown);
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(store)) => tracing::info!(tasks = store.len(), "dashboard shut down"),
                Ok(Err(e)) => tracing::error!(error = %e, "dashboard task failed"),
                Err(_) => tracing::warn!("dashboard did not stop in time"),
            }
            return Ok(());
        }
    }
}

/// Drain all pending `DashboardEvent`s and apply them to the app.
fn drain_events(app: &mut App, rx: &mut mpsc::Receiver<DashboardEvent>) {
    while let Ok(event) = rx.try_recv() {
        app.apply_event(event);
    }
}

/// Fetch the quote of the day in the background.
fn spawn_quote_fetch(backend: BackendClient, events: mpsc::Sender<DashboardEvent>) {
    tokio::spawn(async move {
        match backend.daily_quote().await {
            Ok(quote) => {
                let _ = events.send(DashboardEvent::Quote(quote)).await;
            }
            Err(e) => tracing::warn!(error = %e, "could not fetch quote of the day"),
        }
    });
}

/// Tracks served by the offline player.
fn demo_library() -> Vec<Track> {
    [
        ("Clair de Lune", "Claude Debussy", 303_000),
        ("Gymnopédie No. 1", "Erik Satie", 185_000),
        ("Weightless", "Marconi Union", 480_000),
        ("Experience", "Ludovico Einaudi", 315_000),
        ("Nuvole Bianche", "Ludovico Einaudi", 357_000),
        ("Intro", "The xx", 127_000),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, artist, duration_ms))| Track {
        uri: format!("offline:track:{i}"),
        name: name.to_string(),
        artists_display_name: artist.to_string(),
        duration_ms,
        image: String::new(),
    })
    .collect()
}
