//! Error types for the lockout module
use thiserror::Error;

/// Rejections from the authentication gate.
///
/// Messages are deliberately generic: neither variant reveals how long the
/// caller must wait or how many attempts remain.
#[derive(Error, Debug)]
pub enum LockoutError {
    #[error("Account temporarily locked")]
    AccountLocked,

    #[error("Too many requests")]
    RateLimited,
}
