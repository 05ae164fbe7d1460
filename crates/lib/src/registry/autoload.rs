//! Session-driven loading of secrets into the registry
//!
//! On login, every secret the identity can read is decrypted once and
//! published into the [`SecretRegistry`] under its namespaced key; on logout
//! the session's entries are withdrawn again. The loader tracks what each
//! session published so that mutations between login and logout can be
//! mirrored into the registry without a full reload.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::SecretRegistry;
use crate::{
    Result,
    secrets::{AccessRole, RevealedSecret, SecretFilter, UserSecretRegistry},
};

/// A mutation to mirror into the registry for live sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOp {
    Created,
    Updated,
    Deleted,
}

/// One registry entry published on behalf of a session.
#[derive(Clone, Debug)]
pub struct LoadedSecretRecord {
    /// The owner-scoped secret key.
    pub secret_key: String,
    /// The namespaced key the value was published under.
    pub registry_key: String,
    /// The secret's owner (not necessarily the session's identity).
    pub owner: Uuid,
    /// The session identity's role for the secret at load time.
    pub role: AccessRole,
}

/// Outcome of a session load: how many secrets made it into the registry
/// and how many were skipped because their records could not be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: usize,
}

/// What one session has published into the registry.
struct SessionLoad {
    identity: Uuid,
    records: Vec<LoadedSecretRecord>,
}

/// Loads a session's accessible secrets into the shared registry and keeps
/// the two in step while the session lives.
pub struct SecretAutoLoader {
    user_secrets: Arc<UserSecretRegistry>,
    registry: Arc<SecretRegistry>,
    sessions: Mutex<HashMap<String, SessionLoad>>,
}

impl SecretAutoLoader {
    pub fn new(user_secrets: Arc<UserSecretRegistry>, registry: Arc<SecretRegistry>) -> Self {
        Self {
            user_secrets,
            registry,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Load every secret `identity` can read and publish it for `token`.
    ///
    /// Individual unreadable records are counted in the report and skipped;
    /// one corrupt record never blocks the rest of the load. Loading the same
    /// token twice replaces the previous load.
    pub fn load_for_session(&self, token: &str, identity: Uuid) -> Result<LoadReport> {
        let summaries = self
            .user_secrets
            .list_accessible(identity, &SecretFilter::new())?;

        let mut report = LoadReport::default();
        let mut records = Vec::with_capacity(summaries.len());

        for summary in summaries {
            match self
                .user_secrets
                .get_from(identity, summary.owner, &summary.key)
            {
                Ok(Some(revealed)) => {
                    records.push(self.publish(&revealed));
                    report.loaded += 1;
                }
                Ok(None) => {
                    // Went away between listing and read; nothing to publish
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %summary.key, error = %e, "secret skipped during session load");
                    report.failed += 1;
                }
            }
        }

        let mut sessions = self.sessions.lock().expect("loader lock poisoned");
        if let Some(previous) = sessions.insert(
            token.to_string(),
            SessionLoad {
                identity,
                records,
            },
        ) {
            self.withdraw_orphaned(&sessions, previous.records);
        }

        tracing::debug!(
            identity = %identity,
            loaded = report.loaded,
            failed = report.failed,
            "session secrets loaded"
        );
        Ok(report)
    }

    /// Withdraw everything `token` published. Returns how many registry
    /// entries were actually removed; entries still referenced by another
    /// live session stay published.
    pub fn unload_for_session(&self, token: &str) -> usize {
        let mut sessions = self.sessions.lock().expect("loader lock poisoned");
        let Some(load) = sessions.remove(token) else {
            return 0;
        };
        self.withdraw_orphaned(&sessions, load.records)
    }

    /// Mirror a single secret mutation into the registry for every session
    /// that can (still) see it.
    pub fn sync_single(&self, owner: Uuid, key: &str, op: SyncOp) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("loader lock poisoned");

        match op {
            SyncOp::Deleted => {
                let mut dropped = Vec::new();
                for load in sessions.values_mut() {
                    load.records.retain(|r| {
                        let gone = r.owner == owner && r.secret_key == key;
                        if gone {
                            dropped.push(r.clone());
                        }
                        !gone
                    });
                }
                self.withdraw_orphaned(&sessions, dropped);
            }
            SyncOp::Created | SyncOp::Updated => {
                let mut dropped = Vec::new();
                for load in sessions.values_mut() {
                    match self.user_secrets.get_from(load.identity, owner, key)? {
                        Some(revealed) => {
                            let record = self.publish(&revealed);
                            // A category change moves the secret to a new
                            // registry key; the superseded entry must be
                            // withdrawn or its plaintext would outlive the
                            // session
                            load.records.retain(|r| {
                                let replaced = r.owner == owner && r.secret_key == key;
                                if replaced && r.registry_key != record.registry_key {
                                    dropped.push(r.clone());
                                }
                                !replaced
                            });
                            load.records.push(record);
                        }
                        None => {
                            // No longer visible to this session
                            load.records.retain(|r| {
                                let gone = r.owner == owner && r.secret_key == key;
                                if gone {
                                    dropped.push(r.clone());
                                }
                                !gone
                            });
                        }
                    }
                }
                self.withdraw_orphaned(&sessions, dropped);
            }
        }
        Ok(())
    }

    /// Registry entries published for `token`, if it has an active load.
    pub fn records_for(&self, token: &str) -> Vec<LoadedSecretRecord> {
        self.sessions
            .lock()
            .expect("loader lock poisoned")
            .get(token)
            .map(|load| load.records.clone())
            .unwrap_or_default()
    }

    fn publish(&self, revealed: &RevealedSecret) -> LoadedSecretRecord {
        let registry_key = registry_key(revealed.role, &revealed.category, &revealed.key);
        self.registry
            .publish(registry_key.clone(), revealed.value.clone());
        LoadedSecretRecord {
            secret_key: revealed.key.clone(),
            registry_key,
            owner: revealed.owner,
            role: revealed.role,
        }
    }

    /// Remove registry entries from `candidates` that no remaining session
    /// references. Returns how many entries were removed.
    fn withdraw_orphaned(
        &self,
        sessions: &HashMap<String, SessionLoad>,
        candidates: Vec<LoadedSecretRecord>,
    ) -> usize {
        let mut removed = 0;
        for record in candidates {
            let still_referenced = sessions
                .values()
                .any(|load| load.records.iter().any(|r| r.registry_key == record.registry_key));
            if !still_referenced && self.registry.remove(&record.registry_key) {
                removed += 1;
            }
        }
        removed
    }
}

/// Namespaced registry key: `{namespace}:{category}:{key}`.
fn registry_key(role: AccessRole, category: &str, key: &str) -> String {
    format!("{}:{}:{}", role.namespace(), category, key)
}
