/// User persistence for identity service
pub mod users;

// Re-export commonly used types
pub use users::{InMemoryUserRepository, UserMutation, UserRepository};
