//! Identity types for the weave social backend.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A unique identifier for a user account.
///
/// Numeric, immutable, assigned by the store at registration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct UserId(i64);

impl UserId {
    /// Create a UserId with the given value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this UserId.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// Error returned when a user id fails to parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid user id: {0}")]
pub struct ParseUserIdError(String);

impl FromStr for UserId {
    type Err = ParseUserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| ParseUserIdError(s.to_string()))
    }
}

/// An opaque session token identifying one authenticated login.
///
/// 32 bytes of random data, displayed as URL-safe base64. Minted at
/// login, revoked at logout; never derived from the user id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken([u8; 32]);

impl SessionToken {
    /// Mint a new random SessionToken.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).expect("getrandom failed");
        Self(bytes)
    }

    /// Create a SessionToken from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() == 32 {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(bytes);
            Some(Self(arr))
        } else {
            None
        }
    }

    /// Get the raw bytes of this SessionToken.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log the full token
        write!(f, "SessionToken({}..)", &self.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display_and_parse() {
        let id = UserId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<UserId>().unwrap(), id);
    }

    #[test]
    fn user_id_parse_rejects_garbage() {
        assert!("".parse::<UserId>().is_err());
        assert!("abc".parse::<UserId>().is_err());
        assert!("1.5".parse::<UserId>().is_err());
    }

    #[test]
    fn user_id_ordering() {
        assert!(UserId::new(1) < UserId::new(2));
    }

    #[test]
    fn user_id_serializes_as_bare_number() {
        let id = UserId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(serde_json::from_str::<UserId>("42").unwrap(), id);
    }

    #[test]
    fn session_token_roundtrip() {
        let original = SessionToken::random();
        let restored = SessionToken::from_bytes(original.as_bytes()).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn session_token_base64_display() {
        let token = SessionToken::random();
        assert_eq!(token.to_string().len(), 43); // 32 bytes = 43 base64 chars (no padding)
    }

    #[test]
    fn session_tokens_are_unique() {
        assert_ne!(SessionToken::random(), SessionToken::random());
    }

    #[test]
    fn session_token_from_invalid_length_fails() {
        assert!(SessionToken::from_bytes(&[0u8; 16]).is_none());
        assert!(SessionToken::from_bytes(&[0u8; 64]).is_none());
    }

    #[test]
    fn session_token_debug_is_truncated() {
        let token = SessionToken::random();
        let debug = format!("{:?}", token);
        assert!(debug.len() < token.to_string().len());
    }
}
