/// Security module for authentication
///
/// Provides core security primitives for identity-service:
/// - Password hashing and verification (Argon2id)
/// - History-bound JWT issuance and verification (HS256 via crypto-core)
///
/// ## Architecture
///
/// - **crypto-core::jwt**: Shared JWT implementation (HS256, caller-supplied key)
/// - **password**: Argon2id password hashing
// Re-export JWT functionality from shared crypto-core library
pub use crypto_core::jwt;
pub use crypto_core::jwt::{Claims, TokenResponse};

pub mod password;

pub use password::{hash_password, verify_password};
