/// Service layer for identity-service
///
/// Provides business logic:
/// - Registration, login and password change with history-bound tokens
pub mod auth;

pub use auth::AuthService;
