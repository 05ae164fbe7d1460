//! Login failure tracking and lockout enforcement
//!
//! Two independent gates run in front of credential verification:
//!
//! - per (identity, source): failures inside a sliding one-hour window; at
//!   the threshold the identity locks for a fixed duration, regardless of
//!   which source the next attempt comes from;
//! - per source: attempts across all identities inside a short window, which
//!   catches credential-stuffing from one address.
//!
//! A locked or throttled attempt is rejected before the password verifier
//! runs, so the expensive hash is never burned for an attacker and timing
//! reveals nothing. Locks release lazily once their deadline passes.

mod errors;
mod store;

pub use errors::LockoutError;
pub use store::{AttemptStore, InMemoryAttemptStore};

use std::sync::Arc;

use crate::{Result, clock::Clock, settings::SecuritySettings};

/// Failure tracking and lockout gate for the authentication flow.
pub struct LockoutGuard {
    store: Arc<dyn AttemptStore>,
    settings: SecuritySettings,
    clock: Arc<dyn Clock>,
}

impl LockoutGuard {
    pub fn new(
        store: Arc<dyn AttemptStore>,
        settings: SecuritySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
        }
    }

    /// Gate an incoming authentication attempt.
    ///
    /// Records the source-wide attempt, then rejects with
    /// [`LockoutError::RateLimited`] when the source exceeds its window
    /// threshold, or [`LockoutError::AccountLocked`] while the identity's
    /// lock deadline has not passed. An elapsed lock is cleared on the way
    /// through.
    pub fn gate(&self, identity: &str, source: &str) -> Result<()> {
        let now = self.clock.now_secs();

        self.store.record_source_attempt(source, now)?;
        let source_count = self
            .store
            .count_source_attempts(source, now - self.settings.ip_attempt_window_secs)?;
        if source_count > self.settings.ip_attempt_threshold {
            tracing::warn!(source, attempts = source_count, "source throttled");
            return Err(LockoutError::RateLimited.into());
        }

        if let Some(until) = self.store.lock_until(identity)? {
            if now <= until {
                return Err(LockoutError::AccountLocked.into());
            }
            // Lock expired; reopen lazily
            self.store.clear_lock(identity)?;
        }
        Ok(())
    }

    /// Record a failed credential check and lock the identity if the
    /// (identity, source) window reaches the threshold.
    pub fn record_failure(&self, identity: &str, source: &str) -> Result<()> {
        let now = self.clock.now_secs();
        self.store.record_failure(identity, source, now)?;

        let count = self
            .store
            .count_failures(identity, source, now - self.settings.attempt_window_secs)?;
        if count >= self.settings.max_login_attempts {
            let until = now + self.settings.lockout_duration_secs;
            self.store.set_lock(identity, until)?;
            tracing::warn!(identity, source, failures = count, "identity locked");
        }
        Ok(())
    }

    /// Clear all failure history and any lock for the identity, across all
    /// sources. Called after a successful login.
    pub fn clear(&self, identity: &str) -> Result<()> {
        self.store.clear_identity(identity)
    }
}
