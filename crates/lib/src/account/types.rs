//! Identity records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse permission level for an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A registered account.
///
/// This is the internal record: it carries the password hash and the wrapped
/// data key, neither of which ever leaves the directory. Callers get the
/// [`IdentityProfile`] view instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,

    /// Normalized (trimmed, lowercased) email; unique across the directory.
    pub email: String,

    /// Argon2id PHC string.
    pub password_hash: String,

    pub display_name: Option<String>,

    pub role: Role,

    /// Disabled identities keep their secrets but cannot log in.
    pub active: bool,

    /// Creation timestamp (Unix seconds).
    pub created_at: i64,

    /// Timestamp of the most recent successful login.
    pub last_login_at: Option<i64>,

    /// The identity's secret-encryption key, wrapped under the master key.
    /// Only the unwrapping side ever sees the plaintext key.
    pub wrapped_data_key: String,
}

impl Identity {
    /// The externally visible view of this identity.
    pub fn profile(&self) -> IdentityProfile {
        IdentityProfile {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            active: self.active,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Identity metadata safe to hand to callers: no hash, no key material.
#[derive(Clone, Debug, Serialize)]
pub struct IdentityProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub active: bool,
    pub created_at: i64,
    pub last_login_at: Option<i64>,
}
