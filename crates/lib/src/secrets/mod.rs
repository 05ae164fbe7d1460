//! Per-user secret records: ownership, sharing, expiration
//!
//! [`UserSecretRegistry`] layers ownership, categories, expiration, access
//! counters, and a shareable access list on top of the durable
//! [`SecretStore`]. Values are encrypted at rest with the owner's data key
//! (resolved through [`DataKeySource`]), so one identity's ciphertexts are
//! useless under another identity's key even if storage leaks in isolation.
//!
//! Read semantics are deliberately enumeration-safe: a missing secret, a
//! soft-deleted secret, an expired secret, and a secret the requester simply
//! cannot see all produce the same `None`.

mod detect;
mod errors;
mod types;

pub use detect::looks_like_secret;
pub use errors::SecretError;
pub use types::{
    AccessRole, DEFAULT_CATEGORY, ExpirationFilter, MAX_SECRET_KEY_LENGTH, RevealedSecret,
    SecretFilter, SecretStats, SecretSummary, SecretValue, UserSecret,
};

use std::sync::Arc;

use uuid::Uuid;
use zeroize::Zeroize;

use crate::{
    Result,
    clock::Clock,
    crypto::{CryptoVault, VaultKey},
    storage::SecretStore,
};

/// Source of unwrapped per-owner data keys.
///
/// Implemented by the identity directory (which holds the wrapped keys and
/// the master vault); tests supply map-backed implementations.
pub trait DataKeySource: Send + Sync {
    /// The unwrapped data key for `owner`.
    fn data_key(&self, owner: Uuid) -> Result<VaultKey>;
}

/// Per-user secret records layered on [`SecretStore`].
pub struct UserSecretRegistry {
    store: Arc<dyn SecretStore>,
    keys: Arc<dyn DataKeySource>,
    clock: Arc<dyn Clock>,
}

impl UserSecretRegistry {
    pub fn new(
        store: Arc<dyn SecretStore>,
        keys: Arc<dyn DataKeySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, keys, clock }
    }

    /// Store a new secret for `owner`.
    ///
    /// Fails with [`SecretError::DuplicateKey`] if a non-deleted secret with
    /// that key already exists for the owner. Storing over a soft-deleted
    /// record replaces it.
    pub fn store(
        &self,
        owner: Uuid,
        key: &str,
        value: &str,
        description: Option<&str>,
        category: Option<&str>,
        expires_at: Option<i64>,
    ) -> Result<()> {
        validate_secret_key(key)?;
        if value.is_empty() {
            return Err(SecretError::EmptyValue.into());
        }

        let storage_key = record_key(owner, key);
        if let Some(existing) = self.load(&storage_key)?
            && !existing.deleted
        {
            return Err(SecretError::DuplicateKey {
                key: key.to_string(),
            }
            .into());
        }

        let envelope = self.owner_vault(owner)?.encrypt(value.as_bytes())?;
        let now = self.clock.now_secs();
        let secret = UserSecret {
            id: Uuid::new_v4(),
            owner,
            key: key.to_string(),
            envelope,
            description: description.map(str::to_string),
            category: category.unwrap_or(DEFAULT_CATEGORY).to_string(),
            created_at: now,
            updated_at: now,
            expires_at,
            access_count: 0,
            last_accessed: None,
            deleted: false,
            shared_with: Default::default(),
        };
        self.save(&secret)
    }

    /// Read a secret visible to `requester` under `key`.
    ///
    /// Owned secrets take precedence over shared ones with the same key.
    /// Returns `None` (not an error) when the secret does not exist, is not
    /// accessible, is soft-deleted, or is expired. Successful reads bump the
    /// access counter and last-accessed timestamp.
    pub fn get(&self, requester: Uuid, key: &str) -> Result<Option<RevealedSecret>> {
        validate_secret_key(key)?;
        let now = self.clock.now_secs();

        if let Some(secret) = self.load(&record_key(requester, key))?
            && secret.is_readable_by(requester, now)
        {
            return Ok(Some(self.reveal(secret, AccessRole::Owned)?));
        }

        // Fall back to records shared with the requester; expiry applies to
        // shared readers exactly as it does to the owner
        for (secret, role) in self.scan_for(requester, Some(key))? {
            if role == AccessRole::Shared && secret.is_readable_by(requester, now) {
                return Ok(Some(self.reveal(secret, role)?));
            }
        }
        Ok(None)
    }

    /// Read a specific owner's secret on behalf of `requester`.
    ///
    /// Same access rules as [`get`](Self::get); used when the caller already
    /// knows which owner's record it wants (e.g. session auto-load).
    pub fn get_from(&self, requester: Uuid, owner: Uuid, key: &str) -> Result<Option<RevealedSecret>> {
        validate_secret_key(key)?;
        let Some(secret) = self.load(&record_key(owner, key))? else {
            return Ok(None);
        };
        let now = self.clock.now_secs();
        if !secret.is_readable_by(requester, now) {
            return Ok(None);
        }
        let role = secret
            .role_for(requester)
            .expect("readable secret must have a role");
        Ok(Some(self.reveal(secret, role)?))
    }

    /// Replace a secret's value (owner-only).
    pub fn update(
        &self,
        requester: Uuid,
        key: &str,
        new_value: &str,
        description: Option<&str>,
        category: Option<&str>,
    ) -> Result<()> {
        if new_value.is_empty() {
            return Err(SecretError::EmptyValue.into());
        }
        let mut secret = self.resolve_owned(requester, key)?;

        secret.envelope = self.owner_vault(secret.owner)?.encrypt(new_value.as_bytes())?;
        if let Some(description) = description {
            secret.description = Some(description.to_string());
        }
        if let Some(category) = category {
            secret.category = category.to_string();
        }
        secret.updated_at = self.clock.now_secs();
        self.save(&secret)
    }

    /// Soft-delete a secret (owner-only). The record stays on disk flagged
    /// deleted; the key becomes free for a new secret.
    pub fn delete(&self, requester: Uuid, key: &str) -> Result<()> {
        let mut secret = self.resolve_owned(requester, key)?;
        secret.deleted = true;
        secret.updated_at = self.clock.now_secs();
        self.save(&secret)
    }

    /// Grant `target` read access (owner-only).
    ///
    /// Fails with [`SecretError::AlreadyShared`] if `target` is already on
    /// the access list.
    pub fn share(&self, requester: Uuid, key: &str, target: Uuid) -> Result<()> {
        if target == requester {
            return Err(SecretError::InvalidTarget {
                reason: "cannot share a secret with its owner".to_string(),
            }
            .into());
        }
        let mut secret = self.resolve_owned(requester, key)?;
        if !secret.shared_with.insert(target) {
            return Err(SecretError::AlreadyShared {
                key: key.to_string(),
                target,
            }
            .into());
        }
        secret.updated_at = self.clock.now_secs();
        self.save(&secret)
    }

    /// Remove `target` from the access list (owner-only).
    ///
    /// Fails with [`SecretError::NotShared`] if `target` is not on the list.
    pub fn revoke(&self, requester: Uuid, key: &str, target: Uuid) -> Result<()> {
        let mut secret = self.resolve_owned(requester, key)?;
        if !secret.shared_with.remove(&target) {
            return Err(SecretError::NotShared {
                key: key.to_string(),
                target,
            }
            .into());
        }
        secret.updated_at = self.clock.now_secs();
        self.save(&secret)
    }

    /// List every secret visible to `requester` (owned plus shared-with),
    /// newest-created first, after applying `filter`.
    pub fn list_accessible(
        &self,
        requester: Uuid,
        filter: &SecretFilter,
    ) -> Result<Vec<SecretSummary>> {
        let now = self.clock.now_secs();
        let mut out = Vec::new();

        for (secret, role) in self.scan_for(requester, None)? {
            let keep = match filter.expiration {
                ExpirationFilter::Active => !secret.is_expired(now),
                ExpirationFilter::Expired => secret.is_expired(now),
                ExpirationFilter::Any => true,
            };
            if keep && filter.matches_metadata(&secret, role) {
                out.push(secret.summary_for(role));
            }
        }

        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.key.cmp(&b.key)));
        Ok(out)
    }

    /// Secret counts for the account overview.
    pub fn stats(&self, requester: Uuid) -> Result<SecretStats> {
        let now = self.clock.now_secs();
        let mut stats = SecretStats::default();

        for (secret, role) in self.scan_for(requester, None)? {
            if secret.is_expired(now) {
                if role == AccessRole::Owned {
                    stats.expired += 1;
                }
                continue;
            }
            stats.total += 1;
            match role {
                AccessRole::Owned => stats.owned += 1,
                AccessRole::Shared => stats.shared_with_me += 1,
            }
        }
        Ok(stats)
    }

    // === internal ===

    fn owner_vault(&self, owner: Uuid) -> Result<CryptoVault> {
        Ok(CryptoVault::new(self.keys.data_key(owner)?))
    }

    /// Resolve a record the requester may mutate: their own non-deleted
    /// record under `key`. A visible-but-shared record maps to `NotOwner`,
    /// anything else to `NotFoundOrNoAccess`.
    fn resolve_owned(&self, requester: Uuid, key: &str) -> Result<UserSecret> {
        validate_secret_key(key)?;
        if let Some(secret) = self.load(&record_key(requester, key))?
            && !secret.deleted
        {
            return Ok(secret);
        }
        for (secret, role) in self.scan_for(requester, Some(key))? {
            if role == AccessRole::Shared && !secret.is_expired(self.clock.now_secs()) {
                return Err(SecretError::NotOwner {
                    key: key.to_string(),
                }
                .into());
            }
        }
        Err(SecretError::NotFoundOrNoAccess {
            key: key.to_string(),
        }
        .into())
    }

    /// Decrypt and return a record, bumping its access counters.
    fn reveal(&self, mut secret: UserSecret, role: AccessRole) -> Result<RevealedSecret> {
        let vault = self.owner_vault(secret.owner)?;
        let mut plaintext = vault.decrypt(&secret.envelope)?;
        let value = match String::from_utf8(plaintext.clone()) {
            Ok(s) => SecretValue::new(s),
            Err(_) => {
                plaintext.zeroize();
                return Err(SecretError::CorruptRecord {
                    key: secret.key.clone(),
                }
                .into());
            }
        };
        plaintext.zeroize();

        secret.access_count += 1;
        secret.last_accessed = Some(self.clock.now_secs());
        self.save(&secret)?;

        Ok(RevealedSecret {
            key: secret.key,
            value,
            description: secret.description,
            category: secret.category,
            owner: secret.owner,
            role,
        })
    }

    /// Walk every stored record visible to `requester`, optionally narrowed
    /// to one secret key. Corrupt records are logged and skipped so a single
    /// bad file cannot take down listings.
    fn scan_for(
        &self,
        requester: Uuid,
        key: Option<&str>,
    ) -> Result<Vec<(UserSecret, AccessRole)>> {
        let mut found = Vec::new();
        for storage_key in self.store.list()? {
            if parse_record_key(&storage_key).is_none() {
                continue;
            }
            let secret = match self.load(&storage_key) {
                Ok(Some(secret)) => secret,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(record = %storage_key, error = %e, "skipping unreadable secret record");
                    continue;
                }
            };
            if secret.deleted {
                continue;
            }
            if let Some(key) = key
                && secret.key != key
            {
                continue;
            }
            if let Some(role) = secret.role_for(requester) {
                found.push((secret, role));
            }
        }
        Ok(found)
    }

    fn load(&self, storage_key: &str) -> Result<Option<UserSecret>> {
        let Some(blob) = self.store.get(storage_key)? else {
            return Ok(None);
        };
        let secret =
            serde_json::from_str(&blob).map_err(|_| SecretError::CorruptRecord {
                key: storage_key.to_string(),
            })?;
        Ok(Some(secret))
    }

    fn save(&self, secret: &UserSecret) -> Result<()> {
        let blob = serde_json::to_string(secret)?;
        self.store.put(&record_key(secret.owner, &secret.key), &blob)
    }
}

/// Storage key for an owner's secret record: `<owner-uuid>.<key>`.
fn record_key(owner: Uuid, key: &str) -> String {
    format!("{owner}.{key}")
}

/// Split a storage key back into `(owner, secret key)`.
///
/// The owner UUID is a fixed 36 bytes, so the split is unambiguous even
/// though secret keys may contain dots.
fn parse_record_key(storage_key: &str) -> Option<(Uuid, &str)> {
    if storage_key.len() < 38 || storage_key.as_bytes()[36] != b'.' {
        return None;
    }
    let owner = Uuid::parse_str(&storage_key[..36]).ok()?;
    Some((owner, &storage_key[37..]))
}

/// Validate a secret key: non-empty, bounded, filesystem-safe alphabet.
fn validate_secret_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SecretError::InvalidKey {
            reason: "key is empty".to_string(),
        }
        .into());
    }
    if key.len() > MAX_SECRET_KEY_LENGTH {
        return Err(SecretError::InvalidKey {
            reason: format!("key exceeds {MAX_SECRET_KEY_LENGTH} bytes"),
        }
        .into());
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(SecretError::InvalidKey {
            reason: format!("character '{bad}' is not allowed"),
        }
        .into());
    }
    Ok(())
}
