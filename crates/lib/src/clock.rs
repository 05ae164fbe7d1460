//! Time provider abstraction
//!
//! Session expiry, lockout release, and secret expiration are all evaluated
//! lazily against a [`Clock`] rather than via timer threads. Production code
//! uses [`SystemClock`]; tests use [`FixedClock`] to step through lockout and
//! expiry windows deterministically.

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as seconds since Unix epoch.
    fn now_secs(&self) -> i64;

    /// Returns the current time as an RFC3339-formatted string.
    ///
    /// Used for human-readable audit timestamps.
    fn now_rfc3339(&self) -> String {
        use chrono::{TimeZone, Utc};
        Utc.timestamp_opt(self.now_secs(), 0)
            .single()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string())
    }
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Test clock with manually controlled time.
///
/// Unlike [`SystemClock`], this clock only moves when told to, which makes
/// window-boundary assertions (lockout release, session expiry) exact.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct FixedClock {
    secs: Mutex<i64>,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a new fixed clock at the given time in epoch seconds.
    pub fn new(secs: i64) -> Self {
        Self {
            secs: Mutex::new(secs),
        }
    }

    /// Advance the clock by the given number of seconds.
    pub fn advance(&self, secs: i64) {
        *self.secs.lock().unwrap() += secs;
    }

    /// Set the clock to a specific time in epoch seconds.
    pub fn set(&self, secs: i64) {
        *self.secs.lock().unwrap() = secs;
    }

    /// Get the current time without any side effects.
    pub fn get(&self) -> i64 {
        *self.secs.lock().unwrap()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        *self.secs.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_stays_put() {
        let clock = FixedClock::new(1000);
        assert_eq!(clock.now_secs(), 1000);
        assert_eq!(clock.now_secs(), 1000);
    }

    #[test]
    fn fixed_clock_advance_and_set() {
        let clock = FixedClock::new(1000);
        clock.advance(500);
        assert_eq!(clock.now_secs(), 1500);
        clock.set(10);
        assert_eq!(clock.now_secs(), 10);
    }

    #[test]
    fn fixed_clock_rfc3339() {
        let clock = FixedClock::new(1_704_067_200);
        assert!(clock.now_rfc3339().starts_with("2024-01-01T00:00:00"));
    }

    #[test]
    fn system_clock_is_sane() {
        // Anything after 2020 counts as working.
        assert!(SystemClock.now_secs() > 1_577_836_800);
    }
}
