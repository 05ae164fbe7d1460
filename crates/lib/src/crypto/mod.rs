//! Cryptographic primitives for the secret system
//!
//! - Argon2id for password hashing
//! - AES-256-GCM vault encryption with a versioned envelope format
//! - Wrapped per-user data keys (envelope encryption)

mod errors;
pub mod password;
mod vault;

pub use errors::CryptoError;
pub use vault::{CryptoVault, KEY_LENGTH, NONCE_LENGTH, VaultKey};
