//! Durable key-to-encrypted-blob storage
//!
//! [`SecretStore`] is the one genuinely cross-process resource in the system.
//! Implementations must make writes atomic from the caller's perspective and
//! keep entries owner-only. Two implementations ship: [`FileStore`]
//! (file-per-entry, write-then-rename) and [`InMemoryStore`] (tests and
//! embedding).
//!
//! Keys are restricted to a filesystem-safe alphabet up front instead of
//! being escaped, which makes the key-to-filename mapping trivially lossless:
//! two distinct keys can never map to the same stored name.

mod errors;
mod file;
mod memory;

pub use errors::StorageError;
pub use file::FileStore;
pub use memory::InMemoryStore;

use crate::Result;

/// Maximum accepted storage key length, in bytes.
pub const MAX_KEY_LENGTH: usize = 255;

/// Durable key → encrypted-blob mapping.
///
/// Values are opaque envelope strings produced by the crypto layer; the store
/// never sees plaintext.
pub trait SecretStore: Send + Sync {
    /// Store a blob under `key`, replacing any previous value.
    fn put(&self, key: &str, blob: &str) -> Result<()>;

    /// Fetch the blob stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove the entry for `key`. Returns whether an entry existed.
    fn delete(&self, key: &str) -> Result<bool>;

    /// List all stored keys, in no particular order.
    fn list(&self) -> Result<Vec<String>>;

    /// Check whether an entry exists for `key`.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Validate a storage key against the allowed alphabet.
///
/// Allowed: ASCII alphanumerics, `_`, `-`, `.`; non-empty; at most
/// [`MAX_KEY_LENGTH`] bytes; must not be `.` or `..` and must not start
/// with a dot (hidden files).
pub fn validate_store_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty".to_string(),
        }
        .into());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: format!("key exceeds {MAX_KEY_LENGTH} bytes"),
        }
        .into());
    }
    if key.starts_with('.') {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key must not start with '.'".to_string(),
        }
        .into());
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: format!("character '{bad}' is not allowed"),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_alphabet() {
        for key in ["api.key", "a", "user-1_secret.v2", "UPPER.lower.123"] {
            assert!(validate_store_key(key).is_ok(), "rejected {key}");
        }
    }

    #[test]
    fn rejects_bad_keys() {
        for key in ["", ".hidden", "..", "a/b", "a b", "emoji🔑", "a\0b"] {
            assert!(validate_store_key(key).is_err(), "accepted {key}");
        }
    }

    #[test]
    fn rejects_oversized_key() {
        let key = "k".repeat(MAX_KEY_LENGTH + 1);
        assert!(validate_store_key(&key).is_err());
    }
}
