//! Identity claims carried by a verified bearer token.

use serde::{Deserialize, Serialize};

/// The authenticated caller of a request.
///
/// Decoded from the token payload, which uses the same field names on the
/// wire: `user_id`, `username`, `iat` and `exp` (Unix seconds).
///
/// # Example
///
/// ```
/// use stepform_core::IdentityClaims;
///
/// let claims = IdentityClaims::new("u1", "user1", 1_700_000_000, 3600);
/// assert_eq!(claims.exp - claims.iat, 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Persistent identifier of the user.
    pub user_id: String,
    /// Display name of the user.
    pub username: String,
    /// Issued-at, Unix seconds.
    pub iat: u64,
    /// Expiry, Unix seconds.
    pub exp: u64,
}

impl IdentityClaims {
    /// Creates claims issued at `issued_at` and valid for `ttl_secs`.
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        issued_at: u64,
        ttl_secs: u64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        }
    }

    /// Seconds left before expiry, measured from `now`.
    #[must_use]
    pub fn remaining_secs(&self, now: u64) -> u64 {
        self.exp.saturating_sub(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let claims = IdentityClaims::new("u1", "user1", 10, 5);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["username"], "user1");
        assert_eq!(json["iat"], 10);
        assert_eq!(json["exp"], 15);
    }

    #[test]
    fn test_remaining_secs_saturates() {
        let claims = IdentityClaims::new("u1", "user1", 100, 60);
        assert_eq!(claims.remaining_secs(130), 30);
        assert_eq!(claims.remaining_secs(500), 0);
    }
}
