//! Error types for the session module
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The identity already holds the maximum number of live sessions.
    /// Creation is refused rather than evicting an old session, so an
    /// active device is never logged out as a side effect.
    #[error("Concurrent session limit reached ({max})")]
    LimitReached { max: usize },
}
