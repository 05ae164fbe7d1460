//! Session creation, validation, and revocation
//!
//! Sessions are bearer capabilities: an opaque 256-bit random token maps to
//! one identity with sliding expiry. The concurrent-session cap is enforced
//! at creation time and never evicts an existing session. Expiry is lazy:
//! an expired session is removed the next time its token is presented.

mod errors;
mod store;
mod types;

pub use errors::SessionError;
pub use store::{InMemorySessionStore, SessionStore};
pub use types::{Session, SourceInfo};

use std::sync::Arc;

use uuid::Uuid;

use crate::{Result, clock::Clock, settings::SecuritySettings};

/// Cookie name under which the session token is transported.
pub const SESSION_COOKIE: &str = "strongroom_session";

/// Byte length of the random session token (256 bits).
const TOKEN_LENGTH: usize = 32;

/// Creates, validates, refreshes, and revokes sessions.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    settings: SecuritySettings,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        settings: SecuritySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
        }
    }

    /// Create a session for `identity`.
    ///
    /// Refused with [`SessionError::LimitReached`] when the identity already
    /// holds `max_concurrent_sessions` live sessions; the caller must revoke
    /// one first.
    pub fn create(
        &self,
        identity: Uuid,
        source: SourceInfo,
        remember_me: bool,
    ) -> Result<Session> {
        let now = self.clock.now_secs();
        let active = self.store.count_active(identity, now)?;
        if active >= self.settings.max_concurrent_sessions {
            return Err(SessionError::LimitReached {
                max: self.settings.max_concurrent_sessions,
            }
            .into());
        }

        let session = Session {
            token: generate_token(),
            identity,
            created_at: now,
            last_activity: now,
            expires_at: now + self.settings.session_ttl(remember_me),
            source,
            remember_me,
        };
        self.store.insert(session.clone())?;
        Ok(session)
    }

    /// Validate a token, refreshing the sliding expiry on success.
    ///
    /// An expired session is removed here and `None` returned; the caller
    /// cannot tell an expired token from one that never existed.
    pub fn validate(&self, token: &str) -> Result<Option<Session>> {
        let Some(mut session) = self.store.get(token)? else {
            return Ok(None);
        };

        let now = self.clock.now_secs();
        if session.is_expired(now) {
            self.store.remove(token)?;
            return Ok(None);
        }

        session.last_activity = now;
        session.expires_at = now + self.settings.session_ttl(session.remember_me);
        self.store.update(&session)?;
        Ok(Some(session))
    }

    /// Revoke a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> Result<bool> {
        self.store.remove(token)
    }

    /// Revoke every session for `identity`, returning how many were removed.
    pub fn revoke_all(&self, identity: Uuid) -> Result<usize> {
        self.store.remove_all(identity)
    }

    /// Revoke every session for `identity` except `keep_token`, returning
    /// how many were removed. Used after a password change so the changing
    /// device stays logged in. A `keep_token` that does not belong to
    /// `identity` protects nothing.
    pub fn revoke_others(&self, identity: Uuid, keep_token: &str) -> Result<usize> {
        self.store.remove_all_except(identity, keep_token)
    }

    /// Count the identity's live sessions.
    pub fn count_active(&self, identity: Uuid) -> Result<usize> {
        self.store.count_active(identity, self.clock.now_secs())
    }
}

/// Generate an opaque session token: 32 random bytes, hex-encoded.
fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; TOKEN_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Pull a session token out of transport headers.
///
/// Accepts either an `Authorization: Bearer <token>` header value or a
/// `Cookie` header containing [`SESSION_COOKIE`]; both resolve to the same
/// token string, and the bearer header wins when both are present.
pub fn extract_token<'a>(
    authorization: Option<&'a str>,
    cookie_header: Option<&'a str>,
) -> Option<&'a str> {
    if let Some(auth) = authorization
        && let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    let cookies = cookie_header?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(SESSION_COOKIE)
            && let Some(value) = value.trim_start().strip_prefix('=')
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}
