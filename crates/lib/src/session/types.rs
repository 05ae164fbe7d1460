//! Session data types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an authentication request came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Client address (typically an IP, but any stable string works).
    pub address: String,

    /// Client user agent, when known.
    pub user_agent: Option<String>,
}

impl SourceInfo {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// A time-bounded, revocable proof of authentication tied to one identity.
///
/// The token is the only capability a caller holds; everything else is
/// bookkeeping for sliding expiry and auditing. Serializable so durable
/// [`SessionStore`] implementations can persist rows as-is.
///
/// [`SessionStore`]: super::SessionStore
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Opaque random token (64 hex chars, 256 bits of entropy).
    pub token: String,

    /// The authenticated identity.
    pub identity: Uuid,

    /// Creation timestamp (Unix seconds).
    pub created_at: i64,

    /// Last validated access (Unix seconds); drives sliding expiry.
    pub last_activity: i64,

    /// Hard expiry deadline (Unix seconds), refreshed on each validation.
    pub expires_at: i64,

    /// Request source recorded at login.
    pub source: SourceInfo,

    /// Whether this is a long-lived remember-me session.
    pub remember_me: bool,
}

impl Session {
    /// Whether the session has expired as of `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
