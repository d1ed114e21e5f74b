/// History-bound JWT issuance and verification
///
/// Tokens are HS256 JWTs signed with a per-subject [`SigningKey`] derived from
/// the service secret and the subject's password history. Nothing about issued
/// tokens is stored server-side: a token is valid exactly when its signature
/// matches the key derived *now* and its expiry has not passed.
///
/// ## Security Design
///
/// - **HS256 only**: the algorithm is pinned on both issue and verify
/// - **No cached keys**: callers pass a freshly derived key on every call
/// - **Single failure signal**: malformed, forged, re-keyed and expired tokens
///   all collapse to `false` / `None`
/// - **Caller clock**: expiry is checked against the `now` passed in, so
///   verification is a pure function of `(token, key, now)`
///
/// ## Usage
///
/// ```rust
/// use crypto_core::{derive_signing_key, jwt, SealedBlobCipher};
///
/// let cipher = SealedBlobCipher::generate();
/// let history = vec![cipher.seal(b"0110;").unwrap()];
/// let key = derive_signing_key(b"service-secret", &history);
///
/// let token = jwt::issue("alice", &key, 1_700_000_000, 3600).unwrap();
/// assert!(jwt::verify(&token, &key, 1_700_000_010));
/// ```
use crate::kdf::SigningKey;
use crate::{CryptoError, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// JWT algorithm - HMAC over the derived per-subject key
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

const BEARER_TOKEN_TYPE: &str = "Bearer";

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token response structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            expires_in,
        }
    }
}

// ============================================================================
// Token Generation
// ============================================================================

/// Issue a token for `subject`, valid from `now` until `now + ttl_secs`
///
/// ## Arguments
///
/// * `subject` - Subject identifier placed in `sub`
/// * `key` - Signing key derived from the subject's current history
/// * `now` - Issue time (Unix seconds)
/// * `ttl_secs` - Lifetime in seconds
///
/// ## Returns
///
/// Compact JWS string `header.payload.signature`
pub fn issue(subject: &str, key: &SigningKey, now: i64, ttl_secs: i64) -> Result<String> {
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        exp: now.saturating_add(ttl_secs),
    };

    encode(
        &Header::new(JWT_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|e| CryptoError::Token(format!("Failed to sign token: {e}")))
}

// ============================================================================
// Token Validation
// ============================================================================

/// Check a token against a freshly derived key at time `now`
///
/// Returns `false` for a bad signature (including a key re-derived after a
/// password change), an expired token (`now > exp`), or a malformed token.
pub fn verify(token: &str, key: &SigningKey, now: i64) -> bool {
    verify_claims(token, key, now).is_some()
}

/// Same decision as [`verify`], returning the claims on success
pub fn verify_claims(token: &str, key: &SigningKey, now: i64) -> Option<Claims> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    // Expiry is checked below against the caller's clock
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = match decode::<Claims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
    {
        Ok(data) => data.claims,
        Err(e) => {
            debug!(reason = ?e.kind(), "Token rejected");
            return None;
        }
    };

    if now > claims.exp {
        debug!(exp = claims.exp, now, "Token rejected: expired");
        return None;
    }

    Some(claims)
}

/// Read `sub` without checking the signature or expiry
///
/// ## Security Note
///
/// The result is attacker-controlled. Use it only to find whose history to
/// derive a key from, then call [`verify_claims`]. Never authorize on it.
pub fn peek_subject_unverified(token: &str) -> Option<String> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims.sub)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::derive_signing_key;
    use crate::sealed::SealedBlob;
    use base64::engine::{general_purpose::URL_SAFE_NO_PAD, Engine};

    const T0: i64 = 1_700_000_000;

    fn key_for(blobs: &[&str]) -> SigningKey {
        let history: Vec<SealedBlob> = blobs.iter().map(|b| SealedBlob::from_stored(*b)).collect();
        derive_signing_key(b"test-service-secret", &history)
    }

    #[test]
    fn test_issue_produces_three_parts() {
        let token = issue("alice", &key_for(&["v1"]), T0, 3600).unwrap();
        assert_eq!(token.matches('.').count(), 2); // JWT has 3 parts
    }

    #[test]
    fn test_header_and_payload_layout() {
        let token = issue("alice", &key_for(&["v1"]), T0, 3600).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(payload["sub"], "alice");
        assert_eq!(payload["iat"], T0);
        assert_eq!(payload["exp"], T0 + 3600);
    }

    #[test]
    fn test_verify_valid_token() {
        let key = key_for(&["v1"]);
        let token = issue("alice", &key, T0, 3600).unwrap();
        assert!(verify(&token, &key, T0 + 10));

        let claims = verify_claims(&token, &key, T0 + 10).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expiry_boundary() {
        let key = key_for(&["v1"]);
        let token = issue("alice", &key, T0, 3600).unwrap();
        assert!(verify(&token, &key, T0 + 3600));
        assert!(!verify(&token, &key, T0 + 3601));
    }

    #[test]
    fn test_rekeyed_history_rejects_old_token() {
        let old_key = key_for(&["v1"]);
        let new_key = key_for(&["v2", "v1"]);
        let token = issue("alice", &old_key, T0, 3600).unwrap();

        assert!(!verify(&token, &new_key, T0 + 10));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let key = key_for(&["v1"]);
        for token in ["", "invalid.token.here", "a.b", "....", "not a jwt"] {
            assert!(!verify(token, &key, T0), "accepted {token:?}");
        }
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let key = key_for(&["v1"]);
        let token = issue("alice", &key, T0, 3600).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "sub": "mallory", "iat": T0, "exp": T0 + 3600 }).to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(!verify(&forged, &key, T0 + 10));
    }

    #[test]
    fn test_alg_none_rejected() {
        let key = key_for(&["v1"]);
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD
            .encode(serde_json::json!({ "sub": "alice", "iat": T0, "exp": T0 + 3600 }).to_string());
        let token = format!("{}.{}.", header, payload);
        assert!(!verify(&token, &key, T0 + 10));
    }

    #[test]
    fn test_peek_subject_ignores_signature() {
        let token = issue("alice", &key_for(&["some", "other", "history"]), T0, 60).unwrap();
        assert_eq!(peek_subject_unverified(&token).as_deref(), Some("alice"));
        assert_eq!(peek_subject_unverified("garbage"), None);
    }

    #[test]
    fn test_token_response_bearer() {
        let response = TokenResponse::bearer("abc".to_string(), 3600);
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
    }
}
