//! Identity directory and data-key resolution
//!
//! The directory is the authoritative map of identities, indexed by id and
//! by normalized email. It also owns the link between an identity and its
//! secret-encryption key: the wrapped key lives on the [`Identity`] record,
//! and [`DirectoryKeySource`] unwraps it with the master vault on demand.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use super::{errors::AuthError, types::Identity};
use crate::{Result, crypto::CryptoVault, crypto::VaultKey, secrets::DataKeySource};

#[derive(Default)]
struct DirectoryState {
    identities: HashMap<Uuid, Identity>,
    by_email: HashMap<String, Uuid>,
}

/// In-memory identity directory.
///
/// Both indexes live under one lock so an email can never point at a missing
/// identity.
#[derive(Default)]
pub struct IdentityDirectory {
    state: RwLock<DirectoryState>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new identity. Returns `false` (and inserts nothing) when the
    /// email is already taken.
    pub fn insert(&self, identity: Identity) -> bool {
        let mut state = self.state.write().expect("directory lock poisoned");
        if state.by_email.contains_key(&identity.email) {
            return false;
        }
        state.by_email.insert(identity.email.clone(), identity.id);
        state.identities.insert(identity.id, identity);
        true
    }

    pub fn get(&self, id: Uuid) -> Option<Identity> {
        self.state
            .read()
            .expect("directory lock poisoned")
            .identities
            .get(&id)
            .cloned()
    }

    /// Look up by normalized email.
    pub fn by_email(&self, email: &str) -> Option<Identity> {
        let state = self.state.read().expect("directory lock poisoned");
        let id = state.by_email.get(email)?;
        state.identities.get(id).cloned()
    }

    /// Replace an existing identity record. The email index follows along.
    pub fn update(&self, identity: Identity) -> Result<()> {
        let mut state = self.state.write().expect("directory lock poisoned");
        let Some(previous) = state.identities.get(&identity.id) else {
            return Err(AuthError::UnknownIdentity { id: identity.id }.into());
        };
        if previous.email != identity.email {
            let old_email = previous.email.clone();
            state.by_email.remove(&old_email);
            state.by_email.insert(identity.email.clone(), identity.id);
        }
        state.identities.insert(identity.id, identity);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .expect("directory lock poisoned")
            .identities
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves per-identity data keys by unwrapping the directory's stored
/// wrapped keys with the master vault.
pub struct DirectoryKeySource {
    directory: Arc<IdentityDirectory>,
    master: Arc<CryptoVault>,
}

impl DirectoryKeySource {
    pub fn new(directory: Arc<IdentityDirectory>, master: Arc<CryptoVault>) -> Self {
        Self { directory, master }
    }
}

impl DataKeySource for DirectoryKeySource {
    fn data_key(&self, owner: Uuid) -> Result<VaultKey> {
        let identity = self
            .directory
            .get(owner)
            .ok_or(AuthError::UnknownIdentity { id: owner })?;
        self.master.unwrap_key(&identity.wrapped_data_key)
    }
}
