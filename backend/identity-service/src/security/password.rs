/// Password hashing and verification using Argon2id
use crate::error::{IdentityError, Result};
use crate::validators::{validate_password, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id algorithm
///
/// ## Security
///
/// - Algorithm: Argon2id (default configuration)
/// - Salt: Random 16-byte salt generated per password
///
/// ## Returns
///
/// PHC-formatted hash string. The string is what the password history
/// digests, so two hashes of the same password yield different entries.
///
/// ## Errors
///
/// Returns error if:
/// - Password is outside the allowed length
/// - Hashing operation fails
pub fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
///
/// Uses constant-time comparison. Returns `false` on mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| IdentityError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Validate password length
///
/// ## Errors
///
/// Returns `IdentityError::WeakPassword` with the allowed range
pub fn validate_password_strength(password: &str) -> Result<()> {
    if !validate_password(password) {
        return Err(IdentityError::WeakPassword(format!(
            "Password must be between {} and {} characters",
            PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_valid_password() {
        let password = "StrongP@ssw0rd!";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).expect("should verify successfully"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let password = "StrongP@ssw0rd!";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(!verify_password("WrongPassword123!", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_password_too_short() {
        let result = hash_password("Short1!");
        assert!(matches!(result, Err(IdentityError::WeakPassword(_))));
    }

    #[test]
    fn test_password_too_long() {
        let result = hash_password(&"x".repeat(101));
        assert!(matches!(result, Err(IdentityError::WeakPassword(_))));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let result = verify_password("whatever1", "not-a-phc-string");
        assert!(matches!(result, Err(IdentityError::Internal(_))));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "StrongP@ssw0rd!";
        let hash1 = hash_password(password).expect("should hash successfully");
        let hash2 = hash_password(password).expect("should hash successfully");
        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }
}
