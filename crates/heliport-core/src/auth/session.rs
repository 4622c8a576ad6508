use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// An authenticated principal as known to this process.
///
/// Sessions are handed out as `Arc<Session>` snapshots and never mutated in
/// place; a refreshed token arrives as a new `Session`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Bearer token for the hosted services. Opaque to the core.
    pub credential_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() >= refresh_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }

    /// Name to greet the user with: the display name when known, else the email.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("expires_at", &self.expires_at)
            .field("credential_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Authentication state exposed to the rest of the application.
///
/// Starts as `Loading` and, once resolved, only moves between
/// `Authenticated` and `Unauthenticated`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Authenticated(Arc<Session>),
    Unauthenticated,
}

impl SessionState {
    /// Resolve a notification payload into a definitive state.
    /// An already-expired session counts as no session.
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) if !session.is_expired() => {
                SessionState::Authenticated(Arc::new(session))
            }
            _ => SessionState::Unauthenticated,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session().map(|s| s.user_id.as_str())
    }

    /// Short name for logging
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
        }
    }
}

/// On-disk persistence for the current session, so a restart can pick up
/// where the previous run left off.
#[derive(Debug, Clone)]
pub struct SessionFile {
    cache_dir: PathBuf,
}

impl SessionFile {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load session from disk
    pub fn load(&self) -> Result<Option<Session>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let session: Session =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(session))
    }

    /// Save session to disk
    pub fn save(&self, session: &Session) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Clear session data
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
