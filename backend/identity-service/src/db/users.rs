/// User storage for identity-service
use crate::domain::User;
use crate::error::{IdentityError, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Mutation applied to a stored user inside the repository's unit of work
pub type UserMutation<'a> = Box<dyn FnOnce(&mut User) -> Result<()> + Send + 'a>;

/// Repository trait for user aggregates.
///
/// Implementations must serialize `update` calls for the same username so that
/// concurrent password changes never interleave their history appends.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// `UsernameAlreadyExists` if the username is taken.
    async fn insert(&self, user: User) -> Result<()>;

    /// Load a snapshot of a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Apply `mutation` atomically and return the stored result.
    ///
    /// The mutation either fully applies or, when it returns an error, leaves
    /// the stored user untouched.
    ///
    /// # Errors
    ///
    /// `UserNotFound` if no user has this username, or the mutation's error.
    async fn update(&self, username: &str, mutation: UserMutation<'_>) -> Result<User>;
}

/// Process-local repository backed by a sharded concurrent map
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<()> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(IdentityError::UsernameAlreadyExists),
            Entry::Vacant(slot) => {
                debug!(user_id = %user.id, "Stored new user");
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.get(username).map(|user| user.value().clone()))
    }

    async fn update(&self, username: &str, mutation: UserMutation<'_>) -> Result<User> {
        // The shard write guard is held until the end of this scope
        let mut stored = self
            .users
            .get_mut(username)
            .ok_or(IdentityError::UserNotFound)?;

        let mut working = stored.value().clone();
        mutation(&mut working)?;
        *stored.value_mut() = working.clone();

        Ok(working)
    }
}
