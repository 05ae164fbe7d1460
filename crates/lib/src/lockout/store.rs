//! Attempt tracking storage
//!
//! [`AttemptStore`] keeps the failure windows and lock marks behind a trait
//! so the in-memory shape is not baked into the guard; a durable
//! implementation can be swapped in for multi-process deployments.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::Result;

/// Storage for login-failure windows, identity locks, and per-source
/// attempt counts.
///
/// All timestamps are epoch seconds. Implementations may prune entries older
/// than the `since` bounds they are queried with.
pub trait AttemptStore: Send + Sync {
    /// Append a failure for `(identity, source)` at time `at`.
    fn record_failure(&self, identity: &str, source: &str, at: i64) -> Result<()>;

    /// Count failures for `(identity, source)` at or after `since`,
    /// discarding older entries.
    fn count_failures(&self, identity: &str, source: &str, since: i64) -> Result<u32>;

    /// Mark `identity` locked until `until`.
    fn set_lock(&self, identity: &str, until: i64) -> Result<()>;

    /// The identity's lock deadline, if locked.
    fn lock_until(&self, identity: &str) -> Result<Option<i64>>;

    /// Remove the identity's lock mark.
    fn clear_lock(&self, identity: &str) -> Result<()>;

    /// Drop all failure history and the lock for `identity`, across all
    /// sources.
    fn clear_identity(&self, identity: &str) -> Result<()>;

    /// Append a source-wide attempt (any identity) at time `at`.
    fn record_source_attempt(&self, source: &str, at: i64) -> Result<()>;

    /// Count source-wide attempts at or after `since`, discarding older
    /// entries.
    fn count_source_attempts(&self, source: &str, since: i64) -> Result<u32>;
}

#[derive(Default)]
struct AttemptState {
    /// (identity, source) → failure timestamps
    failures: HashMap<(String, String), Vec<i64>>,
    /// identity → locked-until
    locks: HashMap<String, i64>,
    /// source → attempt timestamps (all identities)
    source_attempts: HashMap<String, Vec<i64>>,
}

/// Process-local [`AttemptStore`].
#[derive(Default)]
pub struct InMemoryAttemptStore {
    state: Mutex<AttemptState>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn record_failure(&self, identity: &str, source: &str, at: i64) -> Result<()> {
        let mut state = self.state.lock().expect("attempt lock poisoned");
        state
            .failures
            .entry((identity.to_string(), source.to_string()))
            .or_default()
            .push(at);
        Ok(())
    }

    fn count_failures(&self, identity: &str, source: &str, since: i64) -> Result<u32> {
        let mut state = self.state.lock().expect("attempt lock poisoned");
        let key = (identity.to_string(), source.to_string());
        let Some(entries) = state.failures.get_mut(&key) else {
            return Ok(0);
        };
        entries.retain(|&t| t >= since);
        Ok(entries.len() as u32)
    }

    fn set_lock(&self, identity: &str, until: i64) -> Result<()> {
        self.state
            .lock()
            .expect("attempt lock poisoned")
            .locks
            .insert(identity.to_string(), until);
        Ok(())
    }

    fn lock_until(&self, identity: &str) -> Result<Option<i64>> {
        Ok(self
            .state
            .lock()
            .expect("attempt lock poisoned")
            .locks
            .get(identity)
            .copied())
    }

    fn clear_lock(&self, identity: &str) -> Result<()> {
        self.state
            .lock()
            .expect("attempt lock poisoned")
            .locks
            .remove(identity);
        Ok(())
    }

    fn clear_identity(&self, identity: &str) -> Result<()> {
        let mut state = self.state.lock().expect("attempt lock poisoned");
        state.failures.retain(|(id, _), _| id != identity);
        state.locks.remove(identity);
        Ok(())
    }

    fn record_source_attempt(&self, source: &str, at: i64) -> Result<()> {
        self.state
            .lock()
            .expect("attempt lock poisoned")
            .source_attempts
            .entry(source.to_string())
            .or_default()
            .push(at);
        Ok(())
    }

    fn count_source_attempts(&self, source: &str, since: i64) -> Result<u32> {
        let mut state = self.state.lock().expect("attempt lock poisoned");
        let Some(entries) = state.source_attempts.get_mut(source) else {
            return Ok(0);
        };
        entries.retain(|&t| t >= since);
        Ok(entries.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_window_prunes() {
        let store = InMemoryAttemptStore::new();
        store.record_failure("alice", "10.0.0.1", 100).unwrap();
        store.record_failure("alice", "10.0.0.1", 200).unwrap();
        store.record_failure("alice", "10.0.0.1", 300).unwrap();

        assert_eq!(store.count_failures("alice", "10.0.0.1", 150).unwrap(), 2);
        // Pruned entries stay gone even with an older bound
        assert_eq!(store.count_failures("alice", "10.0.0.1", 0).unwrap(), 2);
    }

    #[test]
    fn test_buckets_are_per_source() {
        let store = InMemoryAttemptStore::new();
        store.record_failure("alice", "10.0.0.1", 100).unwrap();
        store.record_failure("alice", "10.0.0.2", 100).unwrap();

        assert_eq!(store.count_failures("alice", "10.0.0.1", 0).unwrap(), 1);
        assert_eq!(store.count_failures("alice", "10.0.0.2", 0).unwrap(), 1);
    }

    #[test]
    fn test_clear_identity_spans_sources() {
        let store = InMemoryAttemptStore::new();
        store.record_failure("alice", "10.0.0.1", 100).unwrap();
        store.record_failure("alice", "10.0.0.2", 100).unwrap();
        store.set_lock("alice", 500).unwrap();

        store.clear_identity("alice").unwrap();

        assert_eq!(store.count_failures("alice", "10.0.0.1", 0).unwrap(), 0);
        assert_eq!(store.count_failures("alice", "10.0.0.2", 0).unwrap(), 0);
        assert_eq!(store.lock_until("alice").unwrap(), None);
    }

    #[test]
    fn test_source_attempts_span_identities() {
        let store = InMemoryAttemptStore::new();
        store.record_source_attempt("10.0.0.1", 100).unwrap();
        store.record_source_attempt("10.0.0.1", 200).unwrap();

        assert_eq!(store.count_source_attempts("10.0.0.1", 0).unwrap(), 2);
        assert_eq!(store.count_source_attempts("10.0.0.9", 0).unwrap(), 0);
    }
}
