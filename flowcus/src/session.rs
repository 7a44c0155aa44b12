//! Access and refresh token lifecycle.
//!
//! A [`Session`] hands out a valid access token, refreshing it through a
//! [`TokenRefresher`] once it has expired. Tokens persist through a
//! [`TokenStore`]: a JSON file in the user's config directory for the real
//! client, an in-memory store for tests. A failed refresh wipes the stored
//! tokens so the user is sent back through login.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use flowcus_proto::auth::{ACCESS_TOKEN_LIFETIME_MS, StoredTokens};
use parking_lot::Mutex;

use crate::api::ApiError;

/// Errors from the token session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the token file failed.
    #[error("token store I/O error at {path}: {source}")]
    Store {
        /// Path of the token file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The token file exists but is not valid JSON.
    #[error("token store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// No usable tokens; the user has to log in again.
    #[error("re-authentication required")]
    ReauthRequired,
}

/// Returns the current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

/// Persistence for [`StoredTokens`].
pub trait TokenStore: Send + Sync {
    /// Loads the stored tokens; a store with nothing saved yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing storage cannot be read.
    fn load(&self) -> Result<StoredTokens, SessionError>;

    /// Replaces the stored tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing storage cannot be written.
    fn save(&self, tokens: &StoredTokens) -> Result<(), SessionError>;

    /// Removes all stored tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing storage cannot be cleared.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Exchanges a refresh token for a new access token.
pub trait TokenRefresher: Send + Sync {
    /// Returns a fresh access token.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<String, ApiError>> + Send;
}

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Uses the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/flowcus/session.json`, if a config dir is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flowcus").join("session.json"))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Store {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredTokens, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredTokens::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory token store. Clones share the same tokens.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<Mutex<StoredTokens>>,
}

impl MemoryTokenStore {
    /// Creates a store holding `tokens`.
    #[must_use]
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    /// Returns a copy of the stored tokens.
    #[must_use]
    pub fn snapshot(&self) -> StoredTokens {
        self.tokens.lock().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredTokens, SessionError> {
        Ok(self.snapshot())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), SessionError> {
        *self.tokens.lock() = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.tokens.lock() = StoredTokens::default();
        Ok(())
    }
}

/// Token lifecycle over a store and a refresher.
#[derive(Debug)]
pub struct Session<S: TokenStore, R: TokenRefresher> {
    store: S,
    refresher: R,
    tokens: StoredTokens,
}

impl<S: TokenStore, R: TokenRefresher> Session<S, R> {
    /// Loads the tokens currently in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be read.
    pub fn load(store: S, refresher: R) -> Result<Self, SessionError> {
        let tokens = store.load()?;
        tracing::debug!(
            has_access = tokens.access_token.is_some(),
            has_refresh = tokens.refresh_token.is_some(),
            "session loaded"
        );
        Ok(Self {
            store,
            refresher,
            tokens,
        })
    }

    /// Whether a refresh token is on hand.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.tokens.refresh_token.is_some()
    }

    /// The tokens as currently held.
    #[must_use]
    pub const fn tokens(&self) -> &StoredTokens {
        &self.tokens
    }

    /// Stores tokens captured from the login redirect, valid for one hour.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be written.
    pub fn store_initial(
        &mut self,
        access_token: &str,
        refresh_token: &str,
        now_ms: u64,
    ) -> Result<(), SessionError> {
        self.tokens = StoredTokens {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()).filter(|t| !t.is_empty()),
            expires_at_ms: Some(now_ms.saturating_add(ACCESS_TOKEN_LIFETIME_MS)),
        };
        self.store.save(&self.tokens)?;
        tracing::info!("session tokens stored");
        Ok(())
    }

    /// Returns an access token valid at `now_ms`, refreshing if needed.
    ///
    /// A token without a recorded expiry is treated as expired.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ReauthRequired`] if there is no refresh token
    /// or the refresh is rejected; in the latter case all stored tokens are
    /// cleared.
    pub async fn valid_access_token(&mut self, now_ms: u64) -> Result<String, SessionError> {
        if let (Some(token), Some(expires_at)) =
            (&self.tokens.access_token, self.tokens.expires_at_ms)
            && now_ms < expires_at
        {
            return Ok(token.clone());
        }

        let Some(refresh_token) = self.tokens.refresh_token.clone() else {
            tracing::warn!("access token expired and no refresh token stored");
            return Err(SessionError::ReauthRequired);
        };

        tracing::debug!("refreshing access token");
        match self.refresher.refresh(&refresh_token).await {
            Ok(access_token) => {
                self.tokens.access_token = Some(access_token.clone());
                self.tokens.expires_at_ms = Some(now_ms.saturating_add(ACCESS_TOKEN_LIFETIME_MS));
                self.store.save(&self.tokens)?;
                tracing::info!("access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, clearing session");
                self.clear()?;
                Err(SessionError::ReauthRequired)
            }
        }
    }

    /// Forgets all tokens, in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be cleared.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.tokens = StoredTokens::default();
        self.store.clear()
    }
}
