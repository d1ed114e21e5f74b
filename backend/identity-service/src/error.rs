use crypto_core::CryptoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed for sealed history entry")]
    Authentication,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Whether the message may be shown to the caller as-is
    ///
    /// Internal failures keep their detail in logs only.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IdentityError::InvalidCredentials
                | IdentityError::UserNotFound
                | IdentityError::UsernameAlreadyExists
                | IdentityError::InvalidUsername(_)
                | IdentityError::WeakPassword(_)
        )
    }

    /// Message safe to return across the service boundary
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

// Conversions from external error types
impl From<CryptoError> for IdentityError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidInput(msg) => IdentityError::InvalidInput(msg),
            CryptoError::Authentication => {
                tracing::error!("Sealed history entry failed authentication");
                IdentityError::Authentication
            }
            CryptoError::InvalidKey(msg) => IdentityError::Config(msg),
            other => {
                tracing::error!("Crypto error: {}", other);
                IdentityError::Internal(other.to_string())
            }
        }
    }
}
