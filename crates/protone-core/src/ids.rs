//! Identifier types for ProTone.
//!
//! This module provides the strongly-typed user identifier shared by the
//! service and storage layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of a user id, in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// A user identifier.
///
/// User ids are opaque strings: this service mints them as UUID v4 via
/// [`UserId::generate`], but any stable token carried in a session JWT's
/// `sub` claim is accepted. The id doubles as a quota-owner key in the
/// storage layer, so the alphabet is restricted to printable ASCII and the
/// NUL byte used as a key separator can never appear in a valid id.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Generate a new random `UserId` (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the bytes of the id.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.len() > MAX_USER_ID_LEN {
            return Err(IdError::TooLong);
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(IdError::InvalidCharacter);
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for UserId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is empty.
    #[error("identifier is empty")]
    Empty,

    /// The input exceeds [`MAX_USER_ID_LEN`] bytes.
    #[error("identifier exceeds {MAX_USER_ID_LEN} bytes")]
    TooLong,

    /// The input contains a byte outside printable ASCII.
    #[error("identifier contains a non-printable or non-ASCII byte")]
    InvalidCharacter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::generate();
        let str_repr = id.to_string();
        let parsed = UserId::from_str(&str_repr).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn user_id_serde_json() {
        let id = UserId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn user_id_accepts_opaque_tokens() {
        assert!("cm5x81hyk0000ml03qx".parse::<UserId>().is_ok());
        assert!("auth0|507f1f77bcf86cd799439011".parse::<UserId>().is_ok());
    }

    #[test]
    fn user_id_rejects_empty() {
        assert_eq!("".parse::<UserId>(), Err(IdError::Empty));
    }

    #[test]
    fn user_id_rejects_overlong() {
        let long = "a".repeat(MAX_USER_ID_LEN + 1);
        assert_eq!(long.parse::<UserId>(), Err(IdError::TooLong));
    }

    #[test]
    fn user_id_rejects_separator_bytes() {
        assert_eq!("ab\0cd".parse::<UserId>(), Err(IdError::InvalidCharacter));
        assert_eq!("ab cd".parse::<UserId>(), Err(IdError::InvalidCharacter));
        assert_eq!("ab\ncd".parse::<UserId>(), Err(IdError::InvalidCharacter));
    }

    #[test]
    fn user_id_rejects_non_ascii() {
        assert_eq!("usér-1".parse::<UserId>(), Err(IdError::InvalidCharacter));
    }
}
