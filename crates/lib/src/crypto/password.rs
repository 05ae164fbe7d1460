//! Password hashing and verification
//!
//! Argon2id with per-hash random salts, stored as PHC strings. Secret
//! encryption does not derive keys from passwords (see the vault's wrapped
//! data keys), so password changes never orphan ciphertexts.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::CryptoError;
use crate::Result;

/// Hash a password using Argon2id.
///
/// Returns the hash as a PHC-format string with the salt embedded.
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| CryptoError::PasswordHashFailed {
            reason: e.to_string(),
        })?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
///
/// Returns `Ok(())` on a match, [`CryptoError::InvalidPassword`] otherwise.
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<()> {
    let parsed = PasswordHash::new(password_hash.as_ref()).map_err(|e| {
        CryptoError::PasswordHashFailed {
            reason: format!("stored hash is malformed: {e}"),
        }
    })?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed)
        .map_err(|_| CryptoError::InvalidPassword.into())
}

/// Burn one Argon2 verification against a fixed hash.
///
/// Called when login hits an unknown email so the missing-identity path costs
/// the same as a wrong-password path and timing cannot distinguish them.
pub fn dummy_verify(password: impl AsRef<str>) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| {
        hash_password("strongroom-timing-equalizer").unwrap_or_default()
    });
    let _ = verify_password(password, hash);
}
