/// Identity Service Library
///
/// Provides registration, login and password change with tokens bound to each
/// user's password history.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: User repository (in-memory unit of work)
/// - `domain`: User aggregate and password history ledger
/// - `error`: Error types
/// - `security`: Password hashing, JWT re-exports
/// - `services`: Auth flows
/// - `validators`: Input validation
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod security;
pub mod services;
pub mod validators;

// Re-export commonly used types
pub use error::{IdentityError, Result};
pub use services::AuthService;
