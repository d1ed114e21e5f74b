/// Sealed history blobs
///
/// Provides AES-256-GCM sealing for password-history digests before they are
/// persisted.
///
/// ## Blob Format
///
/// Each blob is standard base64 of:
/// - Nonce (12 bytes): random per call
/// - Ciphertext (variable)
/// - Tag (16 bytes)
///
/// The key is held for the process lifetime. Unless one is configured, a fresh
/// key is generated at startup, so blobs from a previous process can no longer
/// be unsealed. Key derivation hashes the blob text and never unseals, so token
/// revocation does not depend on the key surviving a restart.
use crate::{CryptoError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::engine::{general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Opaque base64 blob stored as a history entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SealedBlob(String);

impl SealedBlob {
    /// Wrap a blob loaded from storage. Content is not validated here; a bad
    /// blob surfaces as `Authentication` on unseal.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// AEAD cipher shared by every caller for the life of the process
#[derive(Clone)]
pub struct SealedBlobCipher {
    cipher: Aes256Gcm,
}

impl SealedBlobCipher {
    /// Create a cipher with a fresh random key
    pub fn generate() -> Self {
        let mut key_bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key_bytes);
        let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes));
        key_bytes.zeroize();
        Self { cipher }
    }

    /// Create a cipher from a base64-encoded 256-bit key
    pub fn from_base64_key(key_base64: &str) -> Result<Self> {
        let mut key_bytes = STANDARD
            .decode(key_base64.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("failed to decode base64: {}", e)))?;

        if key_bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {} bytes",
                KEY_LEN,
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes));
        key_bytes.zeroize();
        Ok(Self { cipher })
    }

    /// Seal plaintext into a base64 blob
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedBlob> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, Payload::from(plaintext))
            .map_err(|_| CryptoError::Encryption)?;

        let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&ciphertext);

        Ok(SealedBlob(STANDARD.encode(framed)))
    }

    /// Recover plaintext from a blob
    ///
    /// Bad base64, a truncated blob, a flipped bit or a foreign key all fail
    /// with `CryptoError::Authentication`.
    pub fn unseal(&self, blob: &SealedBlob) -> Result<Vec<u8>> {
        let framed = STANDARD
            .decode(blob.as_str())
            .map_err(|_| CryptoError::Authentication)?;

        if framed.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Authentication);
        }

        let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), Payload::from(ciphertext))
            .map_err(|_| CryptoError::Authentication)
    }
}

impl std::fmt::Debug for SealedBlobCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBlobCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit seal key encoded in base64
pub fn generate_seal_key() -> String {
    let mut key_bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key_bytes);
    STANDARD.encode(key_bytes)
}
