//! Security policy configuration
//!
//! All thresholds and windows that govern lockout, throttling, sessions, and
//! password-reset tokens live in [`SecuritySettings`]. Durations are stored in
//! seconds; the defaults match the documented policy (5 attempts / 1 hour
//! window / 15 minute lockout, 20 attempts / 5 minutes per source).

use serde::{Deserialize, Serialize};

use crate::Result;

/// Security policy knobs for authentication and session management.
///
/// The struct deserializes with per-field defaults, so a partial JSON config
/// only needs to name the values it overrides.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecuritySettings {
    /// Failed attempts per (identity, source) before the identity locks.
    pub max_login_attempts: u32,

    /// Sliding window over which failures are counted, in seconds.
    pub attempt_window_secs: i64,

    /// How long an identity stays locked once triggered, in seconds.
    pub lockout_duration_secs: i64,

    /// Sliding window for the per-source (IP-wide) throttle, in seconds.
    pub ip_attempt_window_secs: i64,

    /// Attempts from one source across all identities before throttling.
    pub ip_attempt_threshold: u32,

    /// Session lifetime for a normal login, in seconds.
    pub session_ttl_secs: i64,

    /// Session lifetime for a remember-me login, in seconds.
    pub remember_me_ttl_secs: i64,

    /// Live sessions one identity may hold concurrently.
    pub max_concurrent_sessions: usize,

    /// Password-reset token lifetime, in seconds.
    pub reset_token_ttl_secs: i64,

    /// Minimum accepted password length, in bytes.
    pub min_password_length: usize,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            attempt_window_secs: 60 * 60,
            lockout_duration_secs: 15 * 60,
            ip_attempt_window_secs: 5 * 60,
            ip_attempt_threshold: 20,
            session_ttl_secs: 24 * 60 * 60,
            remember_me_ttl_secs: 30 * 24 * 60 * 60,
            max_concurrent_sessions: 5,
            reset_token_ttl_secs: 60 * 60,
            min_password_length: 8,
        }
    }
}

impl SecuritySettings {
    /// Parse settings from a JSON document, filling absent fields from defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Session TTL for the given remember-me flag.
    pub fn session_ttl(&self, remember_me: bool) -> i64 {
        if remember_me {
            self.remember_me_ttl_secs
        } else {
            self.session_ttl_secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let s = SecuritySettings::default();
        assert_eq!(s.max_login_attempts, 5);
        assert_eq!(s.attempt_window_secs, 3600);
        assert_eq!(s.lockout_duration_secs, 900);
        assert_eq!(s.ip_attempt_threshold, 20);
        assert_eq!(s.max_concurrent_sessions, 5);
    }

    #[test]
    fn partial_json_overrides() {
        let s = SecuritySettings::from_json(r#"{"max_login_attempts": 3}"#).unwrap();
        assert_eq!(s.max_login_attempts, 3);
        // Untouched fields fall back to defaults
        assert_eq!(s.lockout_duration_secs, 900);
    }

    #[test]
    fn ttl_honors_remember_me() {
        let s = SecuritySettings::default();
        assert_eq!(s.session_ttl(false), s.session_ttl_secs);
        assert_eq!(s.session_ttl(true), s.remember_me_ttl_secs);
    }
}
