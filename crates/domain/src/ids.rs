use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Stable identifier selecting one character document.
///
/// Chat platforms hand out numeric user ids, but any ASCII alphanumeric
/// string (plus `_` and `-`) is accepted. The restriction keeps a key usable
/// as a file stem without escaping the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserKey(String);

impl UserKey {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidUserKey(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserKey {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for UserKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserKey> for String {
    fn from(value: UserKey) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_platform_ids() {
        let key = UserKey::from(123456789012345678u64);
        assert_eq!(key.as_str(), "123456789012345678");
        assert!(UserKey::new("player_one-2").is_ok());
    }

    #[test]
    fn rejects_keys_that_escape_directory() {
        assert!(matches!(
            UserKey::new("../etc/passwd"),
            Err(DomainError::InvalidUserKey(_))
        ));
        assert!(UserKey::new("").is_err());
        assert!(UserKey::new("a b").is_err());
    }
}
