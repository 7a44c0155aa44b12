//! Configuration system for the Flowcus client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/flowcus/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::playback::CoordinatorConfig;
use crate::playback::spotify::DEFAULT_API_URL;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    backend: BackendFileConfig,
    player: PlayerFileConfig,
    ui: UiFileConfig,
}

/// `[backend]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BackendFileConfig {
    api_url: Option<String>,
    redirect_bind: Option<String>,
}

/// `[player]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PlayerFileConfig {
    spotify_api_url: Option<String>,
    device_id: Option<String>,
    poll_interval_ms: Option<u64>,
    pause_confirm_timeout_ms: Option<u64>,
    collapse_window_ms: Option<u64>,
    end_tolerance_ms: Option<u64>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Backend --
    /// Base URL of `flowcus-server`.
    pub api_url: String,
    /// Local address that receives the login redirect.
    pub redirect_bind: String,

    // -- Player --
    /// Spotify Web API base URL.
    pub spotify_api_url: String,
    /// Fixed playback device; discovered when unset.
    pub device_id: Option<String>,
    /// How often the player state is polled.
    pub poll_interval: Duration,
    /// How long a switch waits for the pause to be confirmed.
    pub pause_confirm_timeout: Duration,
    /// Duplicate player event collapse window.
    pub collapse_window: Duration,
    /// How close to its end a vanished track counts as finished.
    pub end_tolerance_ms: u64,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub ui_poll: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            redirect_bind: "127.0.0.1:3001".to_string(),
            spotify_api_url: DEFAULT_API_URL.to_string(),
            device_id: None,
            poll_interval: Duration::from_millis(1000),
            pause_confirm_timeout: Duration::from_millis(2000),
            collapse_window: Duration::from_millis(300),
            end_tolerance_ms: 1500,
            ui_poll: Duration::from_millis(50),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| file.backend.api_url.clone())
                .unwrap_or(defaults.api_url),
            redirect_bind: cli
                .redirect_bind
                .clone()
                .or_else(|| file.backend.redirect_bind.clone())
                .unwrap_or(defaults.redirect_bind),
            spotify_api_url: file
                .player
                .spotify_api_url
                .clone()
                .unwrap_or(defaults.spotify_api_url),
            device_id: cli
                .device_id
                .clone()
                .or_else(|| file.player.device_id.clone()),
            poll_interval: file
                .player
                .poll_interval_ms
                .map_or(defaults.poll_interval, Duration::from_millis),
            pause_confirm_timeout: file
                .player
                .pause_confirm_timeout_ms
                .map_or(defaults.pause_confirm_timeout, Duration::from_millis),
            collapse_window: file
                .player
                .collapse_window_ms
                .map_or(defaults.collapse_window, Duration::from_millis),
            end_tolerance_ms: file
                .player
                .end_tolerance_ms
                .unwrap_or(defaults.end_tolerance_ms),
            ui_poll: file
                .ui
                .poll_ms
                .map_or(defaults.ui_poll, Duration::from_millis),
        }
    }

    /// Coordinator timings from this configuration.
    #[must_use]
    pub const fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            pause_confirm_timeout: self.pause_confirm_timeout,
            collapse_window: self.collapse_window,
        }
    }
}

/// Subcommands besides the default dashboard.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in with Spotify through the backend and store the tokens.
    Login,
    /// Forget the stored tokens.
    Logout,
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task reminders that complete when their song finishes")]
pub struct CliArgs {
    /// Subcommand; the dashboard runs when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the Flowcus backend.
    #[arg(long, env = "FLOWCUS_API_URL")]
    pub api_url: Option<String>,

    /// Local address that receives the login redirect.
    #[arg(long, env = "FLOWCUS_REDIRECT_BIND")]
    pub redirect_bind: Option<String>,

    /// Spotify device to play on (default: the active device).
    #[arg(long, env = "FLOWCUS_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Run against a built-in player and track list instead of Spotify.
    #[arg(long)]
    pub offline: bool,

    /// Path to config file (default: `~/.config/flowcus/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "FLOWCUS_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/flowcus.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("flowcus").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
