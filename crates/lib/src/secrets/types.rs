//! Core data types for the user secret system

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Category assigned when the caller does not provide one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Maximum accepted secret key length, in bytes.
pub const MAX_SECRET_KEY_LENGTH: usize = 128;

/// An owned, encrypted, shareable, expirable secret scoped to one identity.
///
/// This is the at-rest record: the value is present only as an encrypted
/// envelope produced with the owner's data key. Records are soft-deleted,
/// never removed, so key reuse after deletion is an explicit replace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSecret {
    /// Record id
    pub id: Uuid,

    /// Owning identity
    pub owner: Uuid,

    /// Owner-scoped key (unique per owner among non-deleted records)
    pub key: String,

    /// Encrypted value envelope
    pub envelope: String,

    /// Free-form description
    pub description: Option<String>,

    /// Grouping category (defaults to [`DEFAULT_CATEGORY`])
    pub category: String,

    /// Creation timestamp (Unix seconds)
    pub created_at: i64,

    /// Last modification timestamp (Unix seconds)
    pub updated_at: i64,

    /// Expiration timestamp; `None` means the secret never expires
    pub expires_at: Option<i64>,

    /// Successful reads of this secret
    pub access_count: u64,

    /// Timestamp of the last successful read
    pub last_accessed: Option<i64>,

    /// Soft-deletion flag
    pub deleted: bool,

    /// Identities granted read access by the owner
    pub shared_with: BTreeSet<Uuid>,
}

impl UserSecret {
    /// Whether the secret has expired as of `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|t| t < now)
    }

    /// The requester's relationship to this secret, if any.
    pub fn role_for(&self, requester: Uuid) -> Option<AccessRole> {
        if self.owner == requester {
            Some(AccessRole::Owned)
        } else if self.shared_with.contains(&requester) {
            Some(AccessRole::Shared)
        } else {
            None
        }
    }

    /// Whether `requester` may read this secret as of `now`.
    ///
    /// Expired and soft-deleted secrets are unreadable for everyone,
    /// including the owner.
    pub fn is_readable_by(&self, requester: Uuid, now: i64) -> bool {
        !self.deleted && !self.is_expired(now) && self.role_for(requester).is_some()
    }

    /// Metadata view of this record for `requester`, without the envelope.
    pub fn summary_for(&self, role: AccessRole) -> SecretSummary {
        SecretSummary {
            key: self.key.clone(),
            owner: self.owner,
            description: self.description.clone(),
            category: self.category.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
            access_count: self.access_count,
            last_accessed: self.last_accessed,
            shared_count: self.shared_with.len(),
            role,
        }
    }
}

/// The requester's relationship to a secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    /// Requester is the owner.
    Owned,
    /// Requester is on the access list.
    Shared,
}

impl AccessRole {
    /// Namespace prefix used when publishing into the global registry.
    pub fn namespace(&self) -> &'static str {
        match self {
            AccessRole::Owned => "user",
            AccessRole::Shared => "shared",
        }
    }
}

/// Decrypted secret value, zeroized on drop.
///
/// Plaintext values exist only inside this wrapper; `Debug` never prints the
/// content.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the plaintext.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue(..)")
    }
}

/// A decrypted secret returned from a successful read.
#[derive(Debug)]
pub struct RevealedSecret {
    pub key: String,
    pub value: SecretValue,
    pub description: Option<String>,
    pub category: String,
    pub owner: Uuid,
    pub role: AccessRole,
}

/// Listing entry: record metadata plus the requester's role, no value.
#[derive(Clone, Debug, Serialize)]
pub struct SecretSummary {
    pub key: String,
    pub owner: Uuid,
    pub description: Option<String>,
    pub category: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: Option<i64>,
    pub access_count: u64,
    pub last_accessed: Option<i64>,
    pub shared_count: usize,
    pub role: AccessRole,
}

/// Expiration dimension for listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpirationFilter {
    /// Only live secrets (the default everywhere).
    #[default]
    Active,
    /// Only expired secrets; useful for owner cleanup views.
    Expired,
    /// No expiration filtering.
    Any,
}

/// Filters for [`UserSecretRegistry::list_accessible`].
///
/// [`UserSecretRegistry::list_accessible`]: super::UserSecretRegistry::list_accessible
#[derive(Clone, Debug, Default)]
pub struct SecretFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub role: Option<AccessRole>,
    pub expiration: ExpirationFilter,
}

impl SecretFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Case-insensitive substring match over key, description, and category.
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn role(mut self, role: AccessRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn expiration(mut self, expiration: ExpirationFilter) -> Self {
        self.expiration = expiration;
        self
    }

    /// Whether a secret's metadata passes the category/search/role parts.
    pub(crate) fn matches_metadata(&self, secret: &UserSecret, role: AccessRole) -> bool {
        if let Some(want) = self.role
            && want != role
        {
            return false;
        }
        if let Some(category) = &self.category
            && !secret.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = secret.key.to_lowercase().contains(&needle)
                || secret.category.to_lowercase().contains(&needle)
                || secret
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Secret counts backing the account overview.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SecretStats {
    /// Live secrets visible to the requester (owned + shared).
    pub total: usize,
    /// Live secrets the requester owns.
    pub owned: usize,
    /// Live secrets shared with the requester by others.
    pub shared_with_me: usize,
    /// Expired (non-deleted) secrets the requester owns.
    pub expired: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(owner: Uuid) -> UserSecret {
        UserSecret {
            id: Uuid::new_v4(),
            owner,
            key: "api.key".to_string(),
            envelope: "blob".to_string(),
            description: Some("Production API key".to_string()),
            category: DEFAULT_CATEGORY.to_string(),
            created_at: 100,
            updated_at: 100,
            expires_at: None,
            access_count: 0,
            last_accessed: None,
            deleted: false,
            shared_with: BTreeSet::new(),
        }
    }

    #[test]
    fn test_roles() {
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let mut s = secret(owner);
        s.shared_with.insert(friend);

        assert_eq!(s.role_for(owner), Some(AccessRole::Owned));
        assert_eq!(s.role_for(friend), Some(AccessRole::Shared));
        assert_eq!(s.role_for(stranger), None);
    }

    #[test]
    fn test_expiry_blocks_everyone() {
        let owner = Uuid::new_v4();
        let mut s = secret(owner);
        s.expires_at = Some(50);

        assert!(s.is_expired(51));
        assert!(!s.is_readable_by(owner, 51));
        assert!(s.is_readable_by(owner, 49));
    }

    #[test]
    fn test_namespace_prefixes() {
        assert_eq!(AccessRole::Owned.namespace(), "user");
        assert_eq!(AccessRole::Shared.namespace(), "shared");
    }

    #[test]
    fn test_filter_search() {
        let s = secret(Uuid::new_v4());
        let hit = SecretFilter::new().search("PRODUCTION");
        let miss = SecretFilter::new().search("staging");

        assert!(hit.matches_metadata(&s, AccessRole::Owned));
        assert!(!miss.matches_metadata(&s, AccessRole::Owned));
    }

    #[test]
    fn test_secret_value_debug_is_opaque() {
        let v = SecretValue::new("hunter2");
        assert_eq!(format!("{v:?}"), "SecretValue(..)");
        assert_eq!(v.expose(), "hunter2");
    }
}
