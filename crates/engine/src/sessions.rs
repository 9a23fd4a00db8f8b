//! Live user sessions
//!
//! Sessions cache the permissions computed for their user at login. Whenever
//! a transaction commits a change to authorization-relevant entities, every
//! live session is marked stale; the session refreshes its cached
//! permissions on its next use and clears the flag.

use limsdb_core::SessionBroadcaster;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// State of one logged-in user session
#[derive(Debug, Clone)]
pub struct Session {
    /// The user this session belongs to
    pub user: String,
    /// Whether cached permissions must be recomputed before the next use
    pub auth_stale: bool,
}

/// Registry of live user sessions
///
/// Thread-safe; sessions are opened and closed concurrently with running
/// transactions, and the staleness broadcast arrives from whichever thread
/// committed the triggering transaction.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Session>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Open a session for a user; permissions start fresh
    pub fn open_session(&self, user: impl Into<String>) -> Uuid {
        let token = Uuid::new_v4();
        let user = user.into();
        debug!(target: "limsdb::session", %token, %user, "Session opened");
        self.sessions.insert(
            token,
            Session {
                user,
                auth_stale: false,
            },
        );
        token
    }

    /// Close a session; returns whether it existed
    pub fn close_session(&self, token: Uuid) -> bool {
        let existed = self.sessions.remove(&token).is_some();
        if existed {
            debug!(target: "limsdb::session", %token, "Session closed");
        }
        existed
    }

    /// Whether the session's cached permissions are stale
    ///
    /// Unknown tokens report not-stale; the caller discovers the missing
    /// session through its normal lookup path.
    pub fn is_stale(&self, token: Uuid) -> bool {
        self.sessions
            .get(&token)
            .map_or(false, |session| session.auth_stale)
    }

    /// Clear the staleness flag after the session recomputed its permissions
    pub fn mark_fresh(&self, token: Uuid) {
        if let Some(mut session) = self.sessions.get_mut(&token) {
            session.auth_stale = false;
        }
    }

    /// The user owning a session, if it is live
    pub fn user_of(&self, token: Uuid) -> Option<String> {
        self.sessions.get(&token).map(|session| session.user.clone())
    }

    /// Number of live sessions
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionBroadcaster for SessionRegistry {
    fn refresh_all_sessions(&self) {
        info!(
            target: "limsdb::session",
            sessions = self.sessions.len(),
            "Marking all sessions stale"
        );
        for mut entry in self.sessions.iter_mut() {
            entry.auth_stale = true;
        }
    }
}
