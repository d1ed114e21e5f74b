pub mod aggregates;
pub mod history;

// Re-export commonly used types
pub use aggregates::User;
pub use history::{HistoryEntry, PasswordHistory, DEFAULT_HISTORY_CAPACITY};
