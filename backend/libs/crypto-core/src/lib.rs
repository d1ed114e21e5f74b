//! Cryptographic primitives for history-bound bearer tokens.
//!
//! Every password a user sets is expanded into a binarized digest
//! ([`vector`]), sealed with AES-256-GCM ([`sealed`]) and kept in a bounded
//! history. The signing key for a user's tokens is re-derived from the service
//! secret and that history on every call ([`kdf`]), so a password change
//! silently invalidates every token issued before it ([`jwt`]).

pub mod hash;
pub mod jwt;
pub mod kdf;
pub mod sealed;
pub mod vector;

pub use kdf::{derive_signing_key, SigningKey};
pub use sealed::{SealedBlob, SealedBlobCipher};
pub use vector::{derive_digest, Digest, Vector};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("authentication failed")]
    Authentication,
    #[error("encryption error")]
    Encryption,
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("token error: {0}")]
    Token(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
