//! Error types for the crypto module
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    #[error("Unsupported envelope version: {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Unsupported algorithm id: {id}")]
    UnsupportedAlgorithm { id: u8 },

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("Decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    #[error("Key file I/O failed: {source}")]
    KeyFileIo {
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key file: {reason}")]
    InvalidKeyFile { reason: String },

    #[error("Password hashing failed: {reason}")]
    PasswordHashFailed { reason: String },

    #[error("Invalid password")]
    InvalidPassword,
}

impl CryptoError {
    /// Check if this error indicates a decryption or verification failure
    /// (wrong key, tampered ciphertext, wrong password).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CryptoError::DecryptionFailed { .. } | CryptoError::InvalidPassword
        )
    }
}
