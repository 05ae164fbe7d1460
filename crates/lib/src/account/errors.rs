//! Error types for accounts and authentication
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Registration refused. Deliberately generic: a duplicate email and any
    /// other rejection read the same, so registration cannot be used to
    /// probe which addresses hold accounts.
    #[error("Registration failed")]
    RegistrationFailed,

    /// The supplied email does not look like an address.
    #[error("Invalid email: {reason}")]
    InvalidEmail { reason: String },

    /// Password below the configured minimum length.
    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    /// Wrong email or wrong password; the caller cannot tell which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credentials were correct but the account is disabled.
    #[error("Account is disabled")]
    AccountDisabled,

    /// No valid session for the presented token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Password-reset token is unknown, already used, or expired.
    #[error("Invalid or expired reset token")]
    ResetTokenInvalid,

    /// Internal lookup of an identity that should exist.
    #[error("Unknown identity: {id}")]
    UnknownIdentity { id: Uuid },
}

impl AuthError {
    /// Whether this is a credential or session failure, as opposed to a
    /// validation problem.
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::AccountDisabled
                | AuthError::NotAuthenticated
                | AuthError::ResetTokenInvalid
        )
    }
}
