//! Session Store: who is logged in.
//!
//! Two implementations share one behaviour: the current [`Session`] lives in
//! a `tokio::sync::watch` channel so services can read it synchronously and
//! presentation code can follow changes.
//!
//! - [`MemorySessionStore`] keeps nothing across restarts (tests, embedding)
//! - [`FileSessionStore`] persists to a small JSON file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pocketshop_core::User;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Errors from persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The logged-in user, if any.
///
/// A session is active only when the flag is set *and* a user is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub is_logged_in: bool,
}

impl Session {
    #[must_use]
    pub const fn logged_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_logged_in: true,
        }
    }

    /// The user, if the session is active.
    #[must_use]
    pub fn active_user(&self) -> Option<&User> {
        if self.is_logged_in {
            self.user.as_ref()
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_user().is_some()
    }
}

/// Persists the current session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The session as of now. Never cached by callers.
    fn current(&self) -> Session;

    /// Receiver that observes every session change.
    fn subscribe(&self) -> watch::Receiver<Session>;

    /// Mark `user` as logged in.
    async fn save(&self, user: &User) -> Result<(), SessionError>;

    /// Log out.
    async fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Session Store that lives only as long as the process.
#[derive(Debug)]
pub struct MemorySessionStore {
    tx: watch::Sender<Session>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_session(Session::default())
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx }
    }

    /// Replace the session wholesale, including inactive combinations such
    /// as a user record without the logged-in flag.
    pub fn set(&self, session: Session) {
        self.tx.send_replace(session);
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    async fn save(&self, user: &User) -> Result<(), SessionError> {
        self.tx.send_replace(Session::logged_in(user.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.tx.send_replace(Session::default());
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// On-disk layout. The user record is stored as an embedded JSON string so
/// an unreadable record degrades to "no user" instead of a corrupt file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    is_logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_data: Option<String>,
}

impl SessionFile {
    fn into_session(self) -> Session {
        let user = self.user_data.and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .map_err(|e| tracing::warn!(error = %e, "Ignoring undecodable session user"))
                .ok()
        });
        Session {
            user,
            is_logged_in: self.is_logged_in,
        }
    }
}

/// Session Store persisted as JSON at a fixed path.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    tx: watch::Sender<Session>,
}

impl FileSessionStore {
    /// Open the store, reading any existing session file.
    ///
    /// A missing file means logged out. A file that is not valid JSON is
    /// treated the same way and overwritten on the next save.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let session = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<SessionFile>(&raw) {
                Ok(file) => file.into_session(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Session file is corrupt, starting logged out");
                    Session::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Session::default(),
            Err(e) => return Err(e.into()),
        };
        let (tx, _rx) = watch::channel(session);
        Ok(Self { path, tx })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, file: &SessionFile) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    async fn save(&self, user: &User) -> Result<(), SessionError> {
        let file = SessionFile {
            is_logged_in: true,
            user_data: Some(serde_json::to_string(user)?),
        };
        self.persist(&file).await?;
        self.tx.send_replace(Session::logged_in(user.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.persist(&SessionFile::default()).await?;
        self.tx.send_replace(Session::default());
        Ok(())
    }
}
