/// Integration tests for crypto-core token functionality
///
/// This test module covers:
/// - Token issuance against keys derived from sealed password digests
/// - Revocation by history change
/// - Expiry handling against the caller's clock
/// - Error handling for invalid tokens
use crypto_core::jwt::{issue, peek_subject_unverified, verify, verify_claims};
use crypto_core::{derive_digest, derive_signing_key, SealedBlob, SealedBlobCipher, SigningKey};
use uuid::Uuid;

const SERVICE_SECRET: &[u8] = b"integration-test-service-secret-0123456789";
const T0: i64 = 1_700_000_000;
const TTL: i64 = 3600;

/// Seal the digest of a (stand-in) password hash the way a password change does
fn sealed_vector(cipher: &SealedBlobCipher, password_hash: &str) -> SealedBlob {
    let digest = derive_digest(password_hash).expect("Failed to derive digest");
    cipher.seal(digest.as_bytes()).expect("Failed to seal digest")
}

fn key_for(history: &[SealedBlob]) -> SigningKey {
    derive_signing_key(SERVICE_SECRET, history)
}

// ============================================================================
// Issue / Verify Scenarios
// ============================================================================

#[test]
fn test_token_valid_under_current_history() {
    let cipher = SealedBlobCipher::generate();
    let history = vec![sealed_vector(&cipher, "$argon2id$v=19$first")];

    let k1 = key_for(&history);
    let t1 = issue("alice", &k1, T0, TTL).expect("Failed to issue token");

    assert!(verify(&t1, &k1, T0 + 10), "Fresh token should verify");
}

#[test]
fn test_password_change_revokes_previous_tokens() {
    let cipher = SealedBlobCipher::generate();
    let mut history = vec![sealed_vector(&cipher, "$argon2id$v=19$first")];

    let k1 = key_for(&history);
    let t1 = issue("alice", &k1, T0, TTL).expect("Failed to issue token");

    history.insert(0, sealed_vector(&cipher, "$argon2id$v=19$second"));
    let k2 = key_for(&history);

    assert_ne!(k1, k2, "History change must change the key");
    assert!(!verify(&t1, &k2, T0 + 10), "Old token must fail under new key");

    let t2 = issue("alice", &k2, T0 + 20, TTL).expect("Failed to issue token");
    assert!(verify(&t2, &k2, T0 + 20), "New token should verify immediately");
}

#[test]
fn test_same_password_hash_still_rotates_key() {
    // Sealing is randomized, so re-using a password still changes the history
    let cipher = SealedBlobCipher::generate();
    let first = vec![sealed_vector(&cipher, "$argon2id$v=19$same")];
    let mut second = first.clone();
    second.insert(0, sealed_vector(&cipher, "$argon2id$v=19$same"));

    assert_ne!(key_for(&first), key_for(&second));
}

#[test]
fn test_token_expires_after_ttl() {
    let cipher = SealedBlobCipher::generate();
    let history = vec![sealed_vector(&cipher, "$argon2id$v=19$first")];
    let k1 = key_for(&history);
    let t1 = issue("alice", &k1, T0, TTL).expect("Failed to issue token");

    assert!(verify(&t1, &k1, T0 + TTL), "Token is valid at exp");
    assert!(!verify(&t1, &k1, T0 + TTL + 1), "Token must expire after exp");
}

#[test]
fn test_key_rederivation_is_stable() {
    let cipher = SealedBlobCipher::generate();
    let history = vec![
        sealed_vector(&cipher, "hash-three"),
        sealed_vector(&cipher, "hash-two"),
        sealed_vector(&cipher, "hash-one"),
    ];

    let token = issue("bob", &key_for(&history), T0, TTL).expect("Failed to issue token");

    // A new key derived from an equal snapshot verifies the same token
    let snapshot = history.clone();
    assert!(verify(&token, &key_for(&snapshot), T0 + 1));
}

#[test]
fn test_other_subjects_key_rejected() {
    let cipher = SealedBlobCipher::generate();
    let alice = vec![sealed_vector(&cipher, "alice-hash")];
    let bob = vec![sealed_vector(&cipher, "bob-hash")];

    let token = issue("alice", &key_for(&alice), T0, TTL).expect("Failed to issue token");
    assert!(!verify(&token, &key_for(&bob), T0 + 1));
}

#[test]
fn test_service_secret_is_part_of_key() {
    let cipher = SealedBlobCipher::generate();
    let history = vec![sealed_vector(&cipher, "alice-hash")];

    let token = issue("alice", &key_for(&history), T0, TTL).expect("Failed to issue token");
    let other_secret = derive_signing_key(b"another-service-secret", &history);
    assert!(!verify(&token, &other_secret, T0 + 1));
}

// ============================================================================
// Claims Extraction Tests
// ============================================================================

#[test]
fn test_verify_claims_returns_subject() {
    let cipher = SealedBlobCipher::generate();
    let history = vec![sealed_vector(&cipher, "hash")];
    let key = key_for(&history);

    let subject = Uuid::new_v4().to_string();
    let token = issue(&subject, &key, T0, TTL).expect("Failed to issue token");

    let claims = verify_claims(&token, &key, T0 + 1).expect("Token should verify");
    assert_eq!(claims.sub, subject);
    assert_eq!(claims.iat, T0);
    assert_eq!(claims.exp, T0 + TTL);
}

#[test]
fn test_peek_subject_does_not_imply_validity() {
    let cipher = SealedBlobCipher::generate();
    let history = vec![sealed_vector(&cipher, "hash")];
    let key = key_for(&history);
    let token = issue("alice", &key, T0, TTL).expect("Failed to issue token");

    assert_eq!(peek_subject_unverified(&token).as_deref(), Some("alice"));
    // Expired, yet still peekable
    assert!(!verify(&token, &key, T0 + TTL + 1));
    assert_eq!(peek_subject_unverified(&token).as_deref(), Some("alice"));
}

// ============================================================================
// Invalid Token Tests
// ============================================================================

#[test]
fn test_validate_malformed_token() {
    let cipher = SealedBlobCipher::generate();
    let key = key_for(&[sealed_vector(&cipher, "hash")]);

    let malformed_tokens = vec!["invalid", "two.parts", "", "...", "invalid!@#$.token"];

    for malformed in malformed_tokens {
        assert!(
            !verify(malformed, &key, T0),
            "Should reject malformed token: {}",
            malformed
        );
    }
}

#[test]
fn test_validate_tampered_signature() {
    let cipher = SealedBlobCipher::generate();
    let key = key_for(&[sealed_vector(&cipher, "hash")]);
    let token = issue("alice", &key, T0, TTL).expect("Failed to issue token");

    let (head, signature) = token.rsplit_once('.').expect("JWT has a signature part");
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}.{}{}", head, flipped, &signature[1..]);

    assert!(!verify(&tampered, &key, T0 + 1), "Should reject tampered token");
}
