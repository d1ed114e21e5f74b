/// Authentication service with history-bound tokens
use crate::config::Settings;
use crate::db::UserRepository;
use crate::domain::User;
use crate::error::{IdentityError, Result};
use crate::security::jwt::{self, TokenResponse};
use crate::security::password::{hash_password, verify_password};
use crate::validators::{validate_username, USERNAME_MAX_LEN, USERNAME_MIN_LEN};
use chrono::{DateTime, Utc};
use crypto_core::{derive_digest, derive_signing_key, Digest, SealedBlob, SealedBlobCipher, SigningKey};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Register, log in, change password and verify tokens
///
/// Tokens are signed with a key derived from the service secret and the
/// user's current password history. Changing the password appends to that
/// history, so every token issued before the change stops verifying without
/// any server-side revocation list.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    cipher: SealedBlobCipher,
    service_secret: Arc<[u8]>,
    token_ttl_secs: i64,
    history_capacity: usize,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        cipher: SealedBlobCipher,
        service_secret: impl AsRef<[u8]>,
        token_ttl_secs: i64,
        history_capacity: usize,
    ) -> Self {
        Self {
            repo,
            cipher,
            service_secret: Arc::from(service_secret.as_ref()),
            token_ttl_secs,
            history_capacity: history_capacity.max(1),
        }
    }

    /// Build the service from loaded settings
    pub fn from_settings(repo: Arc<dyn UserRepository>, settings: &Settings) -> anyhow::Result<Self> {
        let cipher = settings.history.cipher()?;
        Ok(Self::new(
            repo,
            cipher,
            settings.jwt.service_secret.as_bytes(),
            settings.jwt.expiry_seconds,
            settings.history.capacity,
        ))
    }

    /// Create a user whose history starts with the initial password
    ///
    /// ## Errors
    ///
    /// - `InvalidUsername` / `WeakPassword` on validation failure
    /// - `UsernameAlreadyExists` if the username is taken
    pub async fn register(&self, username: &str, password: &str) -> Result<Uuid> {
        if !validate_username(username) {
            return Err(IdentityError::InvalidUsername(format!(
                "Username must be {} to {} characters of letters, digits, '-' or '_'",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            )));
        }

        // Fail fast before paying for a hash; insert stays authoritative
        if self.repo.find_by_username(username).await?.is_some() {
            return Err(IdentityError::UsernameAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let sealed = self.seal_password_hash(&password_hash)?;

        let user = User::register(
            username.to_string(),
            password_hash,
            sealed,
            self.history_capacity,
            Utc::now(),
        );
        let user_id = user.id;
        self.repo.insert(user).await?;

        info!(user_id = %user_id, "User registered");
        Ok(user_id)
    }

    /// Authenticate and issue an access token
    ///
    /// Unknown users and wrong passwords return the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.login_at(username, password, Utc::now()).await
    }

    /// [`login`](Self::login) with an explicit issue time
    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenResponse> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password(password, user.password_hash())? {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        let key = self.signing_key(&user);
        let token = jwt::issue(&user.username, &key, now.timestamp(), self.token_ttl_secs)?;

        info!(user_id = %user.id, "User logged in");
        Ok(TokenResponse::bearer(token, self.token_ttl_secs))
    }

    /// Set a new password and rotate the user's signing key
    ///
    /// Hashing and sealing run before the repository's unit of work; the hash
    /// swap and history append run inside it, so concurrent changes for the
    /// same user never interleave.
    ///
    /// ## Errors
    ///
    /// - `UserNotFound` for an unknown username
    /// - `WeakPassword` on validation failure
    pub async fn change_password(&self, username: &str, new_password: &str) -> Result<()> {
        if self.repo.find_by_username(username).await?.is_none() {
            return Err(IdentityError::UserNotFound);
        }

        let password_hash = hash_password(new_password)?;
        let sealed = self.seal_password_hash(&password_hash)?;

        let updated = self
            .repo
            .update(
                username,
                Box::new(move |user: &mut User| {
                    user.change_password(password_hash, sealed, Utc::now());
                    Ok(())
                }),
            )
            .await?;

        info!(
            user_id = %updated.id,
            history_len = updated.history().len(),
            "Password changed; previously issued tokens revoked"
        );
        Ok(())
    }

    /// Return the token's subject if it verifies against the current history
    pub async fn verify_token(&self, token: &str) -> Option<String> {
        self.verify_token_at(token, Utc::now()).await
    }

    /// [`verify_token`](Self::verify_token) at an explicit time
    pub async fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        // Only locates whose history to derive from; the signature check follows
        let subject = jwt::peek_subject_unverified(token)?;

        let user = match self.repo.find_by_username(&subject).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("Token rejected: unknown subject");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Token rejected: user lookup failed");
                return None;
            }
        };

        let key = self.signing_key(&user);
        jwt::verify_claims(token, &key, now.timestamp()).map(|claims| claims.sub)
    }

    /// Decrypt a user's history, newest first
    ///
    /// Diagnostic only. Fails with `Authentication` when an entry was sealed
    /// under a different key, such as one from a previous process.
    pub async fn unseal_history(&self, username: &str) -> Result<Vec<Digest>> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        user.history()
            .blobs()
            .map(|blob| -> Result<Digest> {
                let plaintext = self.cipher.unseal(blob)?;
                let text = String::from_utf8(plaintext).map_err(|_| {
                    IdentityError::Internal("Unsealed history entry is not UTF-8".to_string())
                })?;
                Ok(Digest::parse(text)?)
            })
            .collect()
    }

    fn signing_key(&self, user: &User) -> SigningKey {
        derive_signing_key(&self.service_secret, user.history().blobs())
    }

    fn seal_password_hash(&self, password_hash: &str) -> Result<SealedBlob> {
        let digest = derive_digest(password_hash)?;
        Ok(self.cipher.seal(digest.as_bytes())?)
    }
}
