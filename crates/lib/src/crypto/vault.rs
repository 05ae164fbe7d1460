//! Symmetric vault encryption
//!
//! AES-256-GCM over a self-describing envelope:
//!
//! ```text
//! [magic 0x53][version][algorithm id][12-byte nonce][ciphertext + tag]
//! ```
//!
//! The whole envelope is Base64-encoded (unpadded) for storage. A fresh
//! random nonce is generated per message and never reused. The envelope is
//! versioned so "does this look encrypted" heuristics are unnecessary:
//! decryption rejects anything that is not a well-formed envelope.

use std::fs;
use std::path::Path;

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use base64ct::{Base64Unpadded, Encoding};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::errors::CryptoError;
use crate::Result;

/// Envelope magic byte (`S`).
const ENVELOPE_MAGIC: u8 = 0x53;

/// Current envelope format version.
const ENVELOPE_VERSION: u8 = 0x01;

/// Algorithm id for AES-256-GCM.
const ALG_AES256_GCM: u8 = 0x01;

/// Envelope header length: magic + version + algorithm id.
const HEADER_LENGTH: usize = 3;

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// Key length for AES-256 (32 bytes)
pub const KEY_LENGTH: usize = 32;

/// A 256-bit symmetric key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; KEY_LENGTH]);

impl VaultKey {
    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Build a key from exactly [`KEY_LENGTH`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

/// Symmetric encrypt/decrypt of opaque byte payloads.
///
/// One vault instance wraps one key: the process master key (loaded from an
/// owner-only key file) or an unwrapped per-user data key.
pub struct CryptoVault {
    key: VaultKey,
}

impl CryptoVault {
    /// Create a vault over an existing key.
    pub fn new(key: VaultKey) -> Self {
        Self { key }
    }

    /// Create a vault over a freshly generated key.
    pub fn generate() -> Self {
        Self::new(VaultKey::generate())
    }

    /// Load the master key from `path`, generating and persisting a new one
    /// if the file does not exist.
    ///
    /// The key file holds the hex-encoded key and is created with owner-only
    /// permissions; its parent directory is created `0o700` if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let mut bytes = hex::decode(contents.trim()).map_err(|e| {
                    CryptoError::InvalidKeyFile {
                        reason: format!("key file is not valid hex: {e}"),
                    }
                })?;
                let key = VaultKey::from_slice(&bytes);
                bytes.zeroize();
                Ok(Self::new(key?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = VaultKey::generate();
                write_key_file(path, &key)?;
                Ok(Self::new(key))
            }
            Err(e) => Err(CryptoError::KeyFileIo { source: e }.into()),
        }
    }

    /// Encrypt a plaintext payload into a Base64 envelope string.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes()).map_err(|e| {
            CryptoError::EncryptionFailed {
                reason: format!("failed to create cipher: {e}"),
            }
        })?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext =
            cipher
                .encrypt(&nonce, plaintext)
                .map_err(|e| CryptoError::EncryptionFailed {
                    reason: e.to_string(),
                })?;

        let mut envelope = Vec::with_capacity(HEADER_LENGTH + NONCE_LENGTH + ciphertext.len());
        envelope.push(ENVELOPE_MAGIC);
        envelope.push(ENVELOPE_VERSION);
        envelope.push(ALG_AES256_GCM);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);

        Ok(Base64Unpadded::encode_string(&envelope))
    }

    /// Decrypt a Base64 envelope string produced by [`CryptoVault::encrypt`].
    ///
    /// Fails with [`CryptoError`] on malformed envelopes, unknown versions or
    /// algorithms, and AEAD failures (wrong key or tampered ciphertext).
    pub fn decrypt(&self, envelope: &str) -> Result<Vec<u8>> {
        let raw =
            Base64Unpadded::decode_vec(envelope).map_err(|e| CryptoError::MalformedEnvelope {
                reason: format!("invalid base64: {e}"),
            })?;

        if raw.len() < HEADER_LENGTH + NONCE_LENGTH {
            return Err(CryptoError::MalformedEnvelope {
                reason: format!("envelope too short: {} bytes", raw.len()),
            }
            .into());
        }
        if raw[0] != ENVELOPE_MAGIC {
            return Err(CryptoError::MalformedEnvelope {
                reason: "bad magic byte".to_string(),
            }
            .into());
        }
        if raw[1] != ENVELOPE_VERSION {
            return Err(CryptoError::UnsupportedVersion { version: raw[1] }.into());
        }
        if raw[2] != ALG_AES256_GCM {
            return Err(CryptoError::UnsupportedAlgorithm { id: raw[2] }.into());
        }

        let (nonce_bytes, ciphertext) =
            raw[HEADER_LENGTH..].split_at(NONCE_LENGTH);

        let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes()).map_err(|e| {
            CryptoError::DecryptionFailed {
                reason: format!("failed to create cipher: {e}"),
            }
        })?;

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                CryptoError::DecryptionFailed {
                    reason: "authentication failed (wrong key or tampered data)".to_string(),
                }
                .into()
            })
    }

    /// Wrap (encrypt) a data key under this vault's key.
    ///
    /// Used for envelope encryption: each identity's secrets are encrypted
    /// with a random data key, and only the wrapped form is persisted.
    pub fn wrap_key(&self, data_key: &VaultKey) -> Result<String> {
        self.encrypt(data_key.as_bytes())
    }

    /// Unwrap a data key previously wrapped with [`CryptoVault::wrap_key`].
    pub fn unwrap_key(&self, wrapped: &str) -> Result<VaultKey> {
        let mut plaintext = self.decrypt(wrapped)?;
        let key = VaultKey::from_slice(&plaintext);
        plaintext.zeroize();
        key
    }

    /// Unwrap and re-wrap a data key, producing a fresh envelope.
    ///
    /// Called on password change and reset. With a single static master key
    /// the key material is unchanged; the step exists so wrap-key schemes
    /// that do depend on credentials have a defined hook.
    pub fn rewrap_key(&self, wrapped: &str) -> Result<String> {
        let key = self.unwrap_key(wrapped)?;
        self.wrap_key(&key)
    }
}

/// Persist a key file with owner-only permissions.
fn write_key_file(path: &Path, key: &VaultKey) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_private_dir(parent).map_err(|e| CryptoError::KeyFileIo { source: e })?;
    }

    let encoded = hex::encode(key.as_bytes());
    write_private_file(path, encoded.as_bytes()).map_err(|e| CryptoError::KeyFileIo { source: e })?;
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    match fs::DirBuilder::new().recursive(true).mode(0o700).create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
