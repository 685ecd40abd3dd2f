//! Session token storage and auth-change notification.
//!
//! The backend issues an opaque bearer token at login. Exactly one token is
//! live at a time; it is attached to outgoing requests while present and
//! removed on logout or when the backend reports it invalid. The store is a
//! trait so the HTTP layer can be tested without touching the filesystem.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Storage for the current session token.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Returns the stored token, if any. An empty or whitespace-only token
    /// counts as absent.
    fn token(&self) -> Option<String>;

    /// Persists a new token, replacing any previous one.
    fn store(&self, token: &str) -> Result<()>;

    /// Removes the stored token. Removing an absent token is not an error.
    fn clear(&self) -> Result<()>;
}

/// Session store backed by a plain file under the user config directory.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default token location: `<config_dir>/v2v/token`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine user config directory")?;
        Ok(config_dir.join("v2v").join("token"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write session token to {}", self.path.display()))?;
        debug!("Stored session token at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared session token at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove session token at {}", self.path.display())
            }),
        }
    }
}

/// Authentication state change, published whenever a session begins or ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedIn,
    LoggedOut,
}

/// Size of the broadcast channel for auth events.
const AUTH_EVENT_BUFFER_SIZE: usize = 16;

/// Explicit observable for auth state changes.
///
/// Any interested party subscribes and reacts to login/logout without the
/// publisher knowing about it. Publishing with no subscribers is a no-op.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthState>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(AUTH_EVENT_BUFFER_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn notify(&self, state: AuthState) {
        debug!("Auth state changed: {:?}", state);
        let _ = self.tx.send(state);
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
