//! Signing-key derivation from the service secret and a password history.
//!
//! The key is `SHA-256(secret || blob_1 || blob_2 || ...)` over the sealed
//! blobs in history order (most recent first). It is never cached or stored:
//! callers derive it again for every issue and every verify, so any change to
//! the history changes the key and orphans every token signed with the old one.

use crate::hash::sha256_concat;
use crate::sealed::SealedBlob;
use zeroize::Zeroize;

/// Length of a derived signing key in bytes
pub const SIGNING_KEY_LEN: usize = 32;

/// Per-subject HMAC key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; SIGNING_KEY_LEN]);

impl SigningKey {
    pub fn as_bytes(&self) -> &[u8; SIGNING_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Fold the service secret and every history blob into a signing key
///
/// Blobs contribute the bytes of their base64 text, in the order given.
pub fn derive_signing_key<'a, I>(secret: &'a [u8], history: I) -> SigningKey
where
    I: IntoIterator<Item = &'a SealedBlob>,
{
    let parts = std::iter::once(secret).chain(history.into_iter().map(SealedBlob::as_bytes));
    SigningKey(sha256_concat(parts))
}
