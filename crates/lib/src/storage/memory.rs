//! In-memory secret storage
//!
//! Non-durable [`SecretStore`] used by tests and embedders that manage
//! persistence themselves. Applies the same key validation as [`FileStore`]
//! so behavior stays interchangeable.
//!
//! [`FileStore`]: super::FileStore

use std::collections::HashMap;
use std::sync::RwLock;

use super::{SecretStore, validate_store_key};
use crate::Result;

/// [`SecretStore`] over a process-local map.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("storage lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for InMemoryStore {
    fn put(&self, key: &str, blob: &str) -> Result<()> {
        validate_store_key(key)?;
        self.entries
            .write()
            .expect("storage lock poisoned")
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_store_key(key)?;
        Ok(self
            .entries
            .read()
            .expect("storage lock poisoned")
            .get(key)
            .cloned())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        validate_store_key(key)?;
        Ok(self
            .entries
            .write()
            .expect("storage lock poisoned")
            .remove(key)
            .is_some())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .expect("storage lock poisoned")
            .keys()
            .cloned()
            .collect())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        validate_store_key(key)?;
        Ok(self
            .entries
            .read()
            .expect("storage lock poisoned")
            .contains_key(key))
    }
}
