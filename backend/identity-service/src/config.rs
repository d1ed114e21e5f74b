//! Configuration management for Identity Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use identity_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("Token lifetime: {}s", settings.jwt.expiry_seconds);
//!     Ok(())
//! }
//! ```

use crate::domain::history::DEFAULT_HISTORY_CAPACITY;
use anyhow::{bail, Context, Result};
use crypto_core::SealedBlobCipher;
use std::env;
use std::fmt;
use tracing::{info, warn};

const MIN_SERVICE_SECRET_LEN: usize = 32;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt: JwtSettings,
    pub history: HistorySettings,
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// In debug builds a `.env` file is read first.
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            jwt: JwtSettings::from_env()?,
            history: HistorySettings::from_env()?,
        })
    }
}

/// Token signing settings
#[derive(Clone)]
pub struct JwtSettings {
    /// Service-wide secret folded into every per-user signing key
    pub service_secret: String,
    /// Access token lifetime
    pub expiry_seconds: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let service_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if service_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if service_secret.len() < MIN_SERVICE_SECRET_LEN {
            warn!(
                length = service_secret.len(),
                recommended = MIN_SERVICE_SECRET_LEN,
                "JWT_SECRET is shorter than recommended"
            );
        }

        let expiry_seconds: i64 = env::var("JWT_EXPIRY_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Invalid JWT_EXPIRY_SECONDS")?;
        if expiry_seconds <= 0 {
            bail!("JWT_EXPIRY_SECONDS must be positive, got {}", expiry_seconds);
        }

        Ok(Self {
            service_secret,
            expiry_seconds,
        })
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("service_secret", &"[REDACTED]")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

/// Password history settings
#[derive(Clone)]
pub struct HistorySettings {
    /// Maximum number of sealed entries kept per user
    pub capacity: usize,
    /// Base64 AES-256 key; `None` means a fresh key per process
    pub seal_key: Option<String>,
}

impl HistorySettings {
    fn from_env() -> Result<Self> {
        let capacity: usize = env::var("PASSWORD_HISTORY_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_HISTORY_CAPACITY.to_string())
            .parse()
            .context("Invalid PASSWORD_HISTORY_CAPACITY")?;

        let capacity = if capacity == 0 {
            warn!("PASSWORD_HISTORY_CAPACITY of 0 raised to 1");
            1
        } else {
            capacity
        };

        Ok(Self {
            capacity,
            seal_key: env::var("HISTORY_SEAL_KEY").ok().filter(|k| !k.trim().is_empty()),
        })
    }

    /// Build the process-wide cipher for sealing history entries
    pub fn cipher(&self) -> Result<SealedBlobCipher> {
        match &self.seal_key {
            Some(key) => {
                info!("Using configured history seal key");
                SealedBlobCipher::from_base64_key(key).context("Invalid HISTORY_SEAL_KEY")
            }
            None => {
                info!("No HISTORY_SEAL_KEY configured; sealed history is readable by this process only");
                Ok(SealedBlobCipher::generate())
            }
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            seal_key: None,
        }
    }
}

impl fmt::Debug for HistorySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistorySettings")
            .field("capacity", &self.capacity)
            .field("seal_key", &self.seal_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
