//! Durable auth session: the token pair, the signed-in user, and the
//! single-flight refresh gate every client in the process shares.
//!
//! Tokens live in a small JSON document under the platform config
//! directory. The document is re-read on every access so a pair rotated
//! by one client is immediately visible to all the others.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::error::{ApiError, Result};

/// Identity captured at login time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// On-disk session document. Field names are the storage contract; a
/// document missing either token does not parse and therefore does not
/// count as a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// File-backed persistence for the session document.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at the platform config directory.
    pub fn default_location() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jobdeck")
            .join("session.json");
        SessionStore { path }
    }

    /// Store at an explicit path. Tests point this at a temp directory.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, if the document exists and parses.
    pub fn load(&self) -> Option<StoredSession> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(
                    "discarding unreadable session file {}: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized =
            serde_json::to_string_pretty(session).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    /// Remove the document. Both tokens always go together.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ApiError::Storage(err.to_string())),
        }
    }
}

/// Shared in-memory handle over the store, plus the refresh gate.
///
/// Every client in the process holds the same `Arc<SessionHandle>`, so
/// the gate spans all call sites and concurrent 401 handling collapses
/// into a single refresh.
pub struct SessionHandle {
    store: SessionStore,
    refresh_gate: Mutex<()>,
}

impl SessionHandle {
    pub fn new(store: SessionStore) -> Arc<Self> {
        Arc::new(SessionHandle {
            store,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.load().map(|s| s.jwt_token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.load().map(|s| s.refresh_token)
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.store.load().and_then(|s| s.user)
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.store.load().map(|s| s.saved_at)
    }

    /// Both tokens must be present and non-empty to count as signed in.
    pub fn authenticated(&self) -> bool {
        self.store
            .load()
            .map(|s| !s.jwt_token.is_empty() && !s.refresh_token.is_empty())
            .unwrap_or(false)
    }

    /// Create the session at login.
    pub fn login(&self, access: &str, refresh: &str, user: UserProfile) -> Result<()> {
        self.store.save(&StoredSession {
            jwt_token: access.to_string(),
            refresh_token: refresh.to_string(),
            user: Some(user),
            saved_at: Utc::now(),
        })
    }

    /// Install a rotated token pair, keeping the user profile.
    pub fn install_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        let user = self.store.load().and_then(|s| s.user);
        self.store.save(&StoredSession {
            jwt_token: access.to_string(),
            refresh_token: refresh.to_string(),
            user,
            saved_at: Utc::now(),
        })
    }

    /// Destroy the session. Best effort: a file that cannot be removed is
    /// logged, not surfaced, since logout is already an error path.
    pub fn logout(&self) {
        if let Err(err) = self.store.clear() {
            warn!("failed to clear session storage: {err}");
        }
    }

    /// Gate serializing token refreshes across the whole process.
    pub(crate) async fn refresh_gate(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }
}
