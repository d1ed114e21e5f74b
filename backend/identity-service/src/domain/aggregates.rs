use chrono::{DateTime, Utc};
use crypto_core::SealedBlob;
use std::fmt;
use uuid::Uuid;

use super::history::PasswordHistory;

/// User Aggregate Root
///
/// Owns the password hash and the sealed password history. The history is
/// only ever changed through [`User::change_password`], which keeps the hash
/// swap and the ledger append in the same mutation.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    password_hash: String,
    history: PasswordHistory,

    // Metadata
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub password_changed_at: DateTime<Utc>,
}

impl User {
    /// Create a new user whose history holds the initial password's entry
    pub fn register(
        username: String,
        password_hash: String,
        sealed: SealedBlob,
        history_capacity: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let mut history = PasswordHistory::with_capacity(history_capacity);
        history.append(sealed, now);

        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            history,
            created_at: now,
            updated_at: now,
            password_changed_at: now,
        }
    }

    /// Replace the password hash and record the new sealed digest
    pub fn change_password(&mut self, password_hash: String, sealed: SealedBlob, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.history.append(sealed, now);
        self.password_changed_at = now;
        self.updated_at = now;
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn history(&self) -> &PasswordHistory {
        &self.history
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("history_len", &self.history.len())
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("password_changed_at", &self.password_changed_at)
            .finish()
    }
}
