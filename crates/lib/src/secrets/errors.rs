//! Error types for the user secret system
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Invalid secret key: {reason}")]
    InvalidKey { reason: String },

    #[error("Secret value must not be empty")]
    EmptyValue,

    #[error("Secret already exists: {key}")]
    DuplicateKey { key: String },

    /// Deliberate conflation of "no such secret" and "no access": callers
    /// cannot use this error to probe for other identities' secret keys.
    #[error("Secret not found or not accessible: {key}")]
    NotFoundOrNoAccess { key: String },

    #[error("Only the owner may modify secret: {key}")]
    NotOwner { key: String },

    #[error("Secret {key} is already shared with {target}")]
    AlreadyShared { key: String, target: Uuid },

    #[error("Secret {key} is not shared with {target}")]
    NotShared { key: String, target: Uuid },

    #[error("Invalid share target: {reason}")]
    InvalidTarget { reason: String },

    #[error("Stored record for '{key}' is corrupt")]
    CorruptRecord { key: String },
}

impl SecretError {
    /// Check if this error indicates a resource was not found (or hidden).
    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretError::NotFoundOrNoAccess { .. })
    }

    /// Check if this error is a user-correctable validation failure.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            SecretError::InvalidKey { .. }
                | SecretError::EmptyValue
                | SecretError::InvalidTarget { .. }
        )
    }

    /// Check if this error is an authorization/state conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SecretError::DuplicateKey { .. }
                | SecretError::AlreadyShared { .. }
                | SecretError::NotShared { .. }
        )
    }
}
