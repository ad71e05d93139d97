//! Token signing secret.

use std::fmt;

/// Environment variable holding the token signing secret.
pub const SECRET_ENV_VAR: &str = "JWT_SECRET_KEY";

/// Symmetric key used to sign and verify bearer tokens.
///
/// Never printed: `Debug` shows only whether a value is present.
///
/// # Example
///
/// ```
/// use stepform_config::SecretKey;
///
/// let key = SecretKey::new("s3cr3t");
/// assert_eq!(format!("{key:?}"), "SecretKey(<redacted>)");
/// assert_eq!(key.as_bytes(), b"s3cr3t");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wraps raw key material.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    /// The key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` when no key material is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("SecretKey(<empty>)")
        } else {
            f.write_str("SecretKey(<redacted>)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_shows_key() {
        let key = SecretKey::new("hunter2");
        assert!(!format!("{key:?}").contains("hunter2"));
        assert_eq!(format!("{:?}", SecretKey::default()), "SecretKey(<empty>)");
    }
}
