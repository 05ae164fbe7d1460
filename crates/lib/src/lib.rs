//!
//! Strongroom: encrypted per-user secrets with sessions in front.
//!
//! ## Core Concepts
//!
//! * **Vault (`crypto::CryptoVault`)**: AES-256-GCM over a versioned envelope
//!   format. One master key (loaded from an owner-only key file) wraps a
//!   random data key per identity; values are encrypted under the data key,
//!   so a password change never re-encrypts stored secrets.
//! * **Stores (`storage::SecretStore`)**: A pluggable persistence layer for
//!   encrypted records, with file-backed and in-memory implementations.
//! * **User secrets (`secrets::UserSecretRegistry`)**: Owned, categorized,
//!   expirable records with owner-controlled sharing. Reads are
//!   enumeration-safe: absent, inaccessible, deleted, and expired all read
//!   as `None`.
//! * **Sessions (`session::SessionManager`)**: Opaque bearer tokens with
//!   sliding expiry and a per-identity concurrency cap.
//! * **Lockout (`lockout::LockoutGuard`)**: Failure windows per
//!   (identity, source) plus a per-source throttle, gating credential checks.
//! * **Accounts (`account::AuthenticationService`)**: Registration, login,
//!   logout, password change/reset, wired to an audit trail.
//! * **Registry (`registry::SecretRegistry`)**: The process-wide map of
//!   decrypted secrets, populated per session by the auto-loader under
//!   `{namespace}:{category}:{key}` keys.

pub mod account;
pub mod clock;
pub mod crypto;
pub mod lockout;
pub mod registry;
pub mod secrets;
pub mod session;
pub mod settings;
pub mod storage;

pub use clock::{Clock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the Strongroom library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Strongroom library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured cryptography errors from the crypto module
    #[error(transparent)]
    Crypto(#[from] crypto::CryptoError),

    /// Structured persistence errors from the storage module
    #[error(transparent)]
    Storage(#[from] storage::StorageError),

    /// Structured secret record errors from the secrets module
    #[error(transparent)]
    Secret(#[from] secrets::SecretError),

    /// Structured lockout and throttling errors from the lockout module
    #[error(transparent)]
    Lockout(#[from] lockout::LockoutError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(#[from] session::SessionError),

    /// Structured account and authentication errors from the account module
    #[error(transparent)]
    Auth(#[from] account::AuthError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Crypto(_) => "crypto",
            Error::Storage(_) => "storage",
            Error::Secret(_) => "secrets",
            Error::Lockout(_) => "lockout",
            Error::Session(_) => "session",
            Error::Auth(_) => "account",
        }
    }

    /// Check if this error indicates a resource was not found (or is
    /// deliberately indistinguishable from not found).
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Secret(secret_err) => secret_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::Secret(secrets::SecretError::NotOwner { .. }))
    }

    /// Check if this error indicates a conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Secret(secret_err) => secret_err.is_conflict(),
            Error::Storage(storage::StorageError::KeyCollision { .. }) => true,
            Error::Session(session::SessionError::LimitReached { .. }) => true,
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_authentication_error(),
            Error::Crypto(crypto_err) => crypto_err.is_rejection(),
            _ => false,
        }
    }

    /// Check if this error is a user-correctable validation failure.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Secret(secret_err) => secret_err.is_validation_error(),
            Error::Storage(storage::StorageError::InvalidKey { .. }) => true,
            Error::Auth(account::AuthError::InvalidEmail { .. }) => true,
            Error::Auth(account::AuthError::WeakPassword { .. }) => true,
            _ => false,
        }
    }

    /// Check if this error is a lockout or throttling rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Lockout(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Storage(storage_err) => storage_err.is_io_error(),
            Error::Crypto(crypto::CryptoError::KeyFileIo { .. }) => true,
            _ => false,
        }
    }
}
