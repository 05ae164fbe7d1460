//! Process-wide registry of decrypted secrets
//!
//! The registry is the runtime face of the secret system: whatever a session
//! has loaded lives here under namespaced keys, ready for lookup without
//! touching storage or crypto again. Values are [`SecretValue`]s, so they
//! zeroize when displaced or removed.

mod autoload;

pub use autoload::{LoadReport, LoadedSecretRecord, SecretAutoLoader, SyncOp};

use std::collections::HashMap;
use std::sync::RwLock;

use crate::secrets::SecretValue;

/// Shared map of namespaced keys to decrypted values.
///
/// Keys follow `{namespace}:{category}:{key}`, e.g. `user:database:db.pass`
/// for an owned secret or `shared:general:api.key` for one shared in.
#[derive(Default)]
pub struct SecretRegistry {
    entries: RwLock<HashMap<String, SecretValue>>,
}

impl SecretRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a value, replacing any previous entry under the key.
    pub fn publish(&self, key: impl Into<String>, value: SecretValue) {
        self.entries
            .write()
            .expect("registry lock poisoned")
            .insert(key.into(), value);
    }

    /// Look up a value by its namespaced key.
    pub fn get(&self, key: &str) -> Option<SecretValue> {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(key)
            .cloned()
    }

    /// Remove an entry. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .expect("registry lock poisoned")
            .remove(key)
            .is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .contains_key(key)
    }

    /// Snapshot of all published keys, unordered.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
