//! Session storage
//!
//! Sessions are process-local in the reference shape, but the manager only
//! talks to [`SessionStore`], so a durable implementation can replace the
//! in-memory one without touching authentication logic.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::types::Session;
use crate::Result;

/// Storage for live sessions, keyed by token.
pub trait SessionStore: Send + Sync {
    /// Insert a freshly created session.
    fn insert(&self, session: Session) -> Result<()>;

    /// Look up a session by token.
    fn get(&self, token: &str) -> Result<Option<Session>>;

    /// Persist refreshed expiry/activity fields for an existing session.
    fn update(&self, session: &Session) -> Result<()>;

    /// Remove a session. Returns whether it existed.
    fn remove(&self, token: &str) -> Result<bool>;

    /// Remove every session for `identity`, returning how many were removed.
    fn remove_all(&self, identity: Uuid) -> Result<usize>;

    /// Remove every session for `identity` except the one under `keep_token`,
    /// returning how many were removed. The kept session must stay resolvable
    /// throughout; a `keep_token` belonging to another identity keeps nothing.
    fn remove_all_except(&self, identity: Uuid, keep_token: &str) -> Result<usize>;

    /// Count sessions for `identity` that are still live at `now`.
    fn count_active(&self, identity: Uuid, now: i64) -> Result<usize>;
}

/// Process-local [`SessionStore`].
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) -> Result<()> {
        self.sessions
            .write()
            .expect("session lock poisoned")
            .insert(session.token.clone(), session);
        Ok(())
    }

    fn get(&self, token: &str) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .read()
            .expect("session lock poisoned")
            .get(token)
            .cloned())
    }

    fn update(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .expect("session lock poisoned")
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    fn remove(&self, token: &str) -> Result<bool> {
        Ok(self
            .sessions
            .write()
            .expect("session lock poisoned")
            .remove(token)
            .is_some())
    }

    fn remove_all(&self, identity: Uuid) -> Result<usize> {
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, s| s.identity != identity);
        Ok(before - sessions.len())
    }

    fn remove_all_except(&self, identity: Uuid, keep_token: &str) -> Result<usize> {
        let mut sessions = self.sessions.write().expect("session lock poisoned");
        let before = sessions.len();
        sessions.retain(|token, s| s.identity != identity || token == keep_token);
        Ok(before - sessions.len())
    }

    fn count_active(&self, identity: Uuid, now: i64) -> Result<usize> {
        Ok(self
            .sessions
            .read()
            .expect("session lock poisoned")
            .values()
            .filter(|s| s.identity == identity && !s.is_expired(now))
            .count())
    }
}
