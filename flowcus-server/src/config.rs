//! Configuration system for the Flowcus backend.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/flowcus-server/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;

/// Errors that can occur when loading server configuration.
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

    /// Spotify client credentials were not supplied anywhere.
    #[error("missing Spotify {0} (set SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET)")]
    MissingCredential(&'static str),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the backend.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
    spotify: SpotifyFileConfig,
    quotes: QuotesFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
}

/// `[spotify]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SpotifyFileConfig {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    frontend_redirect_uri: Option<String>,
    authorize_url: Option<String>,
    token_url: Option<String>,
}

/// `[quotes]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct QuotesFileConfig {
    url: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the backend.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Flowcus OAuth and quote backend")]
pub struct ServerCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "FLOWCUS_BIND")]
    pub bind: Option<String>,

    /// Port to listen on all interfaces (ignored when `--bind` is set).
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to config file (default: `~/.config/flowcus-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spotify application client ID.
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Spotify application client secret.
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Callback URL registered with Spotify (points at this server).
    #[arg(long)]
    pub redirect_uri: Option<String>,

    /// Client URL that receives the tokens after login.
    #[arg(long, env = "FLOWCUS_FRONTEND_REDIRECT")]
    pub frontend_redirect_uri: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "FLOWCUS_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved backend configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:3000`).
    pub bind_addr: String,
    /// Spotify application client ID.
    pub client_id: String,
    /// Spotify application client secret.
    pub client_secret: String,
    /// OAuth callback on this server, as registered with Spotify.
    pub redirect_uri: String,
    /// Where the client expects to receive tokens.
    pub frontend_redirect_uri: String,
    /// Spotify authorization page.
    pub authorize_url: String,
    /// Spotify token endpoint.
    pub token_url: String,
    /// Upstream daily-quote endpoint.
    pub quote_url: String,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            frontend_redirect_uri: "http://localhost:3001/callback".to_string(),
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            quote_url: "https://zenquotes.io/api/today".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the Spotify credentials are missing.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        if config.client_id.is_empty() {
            return Err(ConfigError::MissingCredential("client id"));
        }
        if config.client_secret.is_empty() {
            return Err(ConfigError::MissingCredential("client secret"));
        }
        Ok(config)
    }

    /// Resolve a `ServerConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. `--bind` wins over `--port`.
    #[must_use]
    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| cli.port.map(|p| format!("0.0.0.0:{p}")))
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            client_id: cli
                .client_id
                .clone()
                .or_else(|| file.spotify.client_id.clone())
                .unwrap_or(defaults.client_id),
            client_secret: cli
                .client_secret
                .clone()
                .or_else(|| file.spotify.client_secret.clone())
                .unwrap_or(defaults.client_secret),
            redirect_uri: cli
                .redirect_uri
                .clone()
                .or_else(|| file.spotify.redirect_uri.clone())
                .unwrap_or(defaults.redirect_uri),
            frontend_redirect_uri: cli
                .frontend_redirect_uri
                .clone()
                .or_else(|| file.spotify.frontend_redirect_uri.clone())
                .unwrap_or(defaults.frontend_redirect_uri),
            authorize_url: file
                .spotify
                .authorize_url
                .clone()
                .unwrap_or(defaults.authorize_url),
            token_url: file.spotify.token_url.clone().unwrap_or(defaults.token_url),
            quote_url: file.quotes.url.clone().unwrap_or(defaults.quote_url),
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the backend.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<ServerConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ServerConfigFile::default());
        };
        config_dir.join("flowcus-server").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
