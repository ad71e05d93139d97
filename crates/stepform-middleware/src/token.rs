//! Bearer token issuance and verification.
//!
//! Tokens are HS256-signed JWTs whose payload is an [`IdentityClaims`]. They
//! are stateless: a token is valid if its signature checks out against the
//! process secret and its `exp` lies in the future.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use stepform_core::IdentityClaims;
use thiserror::Error;

/// Validity window of issued tokens.
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors from issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing failed.
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// The token is malformed, forged or expired.
    #[error("token rejected")]
    Rejected(#[source] jsonwebtoken::errors::Error),

    /// The system clock reads earlier than the Unix epoch.
    #[error("system clock is before the Unix epoch")]
    Clock,
}

/// Signs and verifies tokens with one symmetric key.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    /// Creates a signer issuing tokens valid for [`TOKEN_TTL`].
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, TOKEN_TTL)
    }

    /// Creates a signer issuing tokens valid for `ttl`.
    #[must_use]
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for the given user, starting now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the clock is unusable or signing fails.
    pub fn issue(&self, user_id: &str, username: &str) -> Result<String, TokenError> {
        let claims = IdentityClaims::new(user_id, username, unix_now()?, self.ttl.as_secs());
        self.sign(&claims)
    }

    /// Signs arbitrary claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if encoding fails.
    pub fn sign(&self, claims: &IdentityClaims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verifies signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Rejected` for any verification failure.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        decode::<IdentityClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Rejected)
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Issues a one-hour token for `user_id` signed with `secret`.
///
/// # Errors
///
/// Returns `TokenError` if signing fails.
pub fn generate_token(user_id: &str, username: &str, secret: &[u8]) -> Result<String, TokenError> {
    TokenSigner::new(secret).issue(user_id, username)
}

/// Verifies a token signed with `secret`.
///
/// # Errors
///
/// Returns `TokenError::Rejected` for any verification failure.
pub fn verify_token(token: &str, secret: &[u8]) -> Result<IdentityClaims, TokenError> {
    TokenSigner::new(secret).verify(token)
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-key";

    #[test]
    fn test_round_trip() {
        let before = unix_now().unwrap();
        let token = generate_token("u1", "user1", KEY).unwrap();
        let claims = verify_token(&token, KEY).unwrap();

        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.username, "user1");

        let remaining = claims.remaining_secs(before);
        assert!((59 * 60..=60 * 60).contains(&remaining), "{remaining}");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = generate_token("u1", "user1", KEY).unwrap();
        assert!(matches!(
            verify_token(&token, b"other-key"),
            Err(TokenError::Rejected(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(verify_token("invalid.token.value", KEY).is_err());
        assert!(verify_token("", KEY).is_err());
    }

    #[test]
    fn test_expired_rejected() {
        let signer = TokenSigner::new(KEY);
        let now = unix_now().unwrap();
        let expired = IdentityClaims::new("u1", "user1", now - 7200, 3600);
        let token = signer.sign(&expired).unwrap();

        assert!(matches!(signer.verify(&token), Err(TokenError::Rejected(_))));
    }

    #[test]
    fn test_issued_lifetime_matches_ttl() {
        let signer = TokenSigner::with_ttl(KEY, Duration::from_secs(90));
        assert_eq!(signer.ttl(), Duration::from_secs(90));
        assert_eq!(TokenSigner::new(KEY).ttl(), TOKEN_TTL);

        let claims = signer.verify(&signer.issue("u1", "user1").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, signer.ttl().as_secs());
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", TokenSigner::new(KEY));
        assert!(debug.contains("TokenSigner"));
        assert!(!debug.contains("test-key"));
    }
}
