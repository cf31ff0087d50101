//! Character sheet operation errors.

use tavern_domain::{DiceParseError, DomainError, UserKey};

use crate::infrastructure::ports::RepoError;

/// Errors that can occur during character sheet operations.
///
/// Every failure leaves the stored document as it was.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("No character sheet for user {0}")]
    CharacterNotFound(UserKey),

    #[error("Character sheet for user {key} is corrupt: {message}")]
    CorruptDocument { key: UserKey, message: String },

    #[error("Invalid dice expression: {0}")]
    InvalidExpression(DiceParseError),

    #[error("Insufficient funds: requested {requested_cp} cp, available {available_cp} cp")]
    InsufficientFunds { requested_cp: i64, available_cp: i64 },

    #[error("Insufficient resource: requested {requested}, available {available}")]
    InsufficientResource { requested: i64, available: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Path conflict at '{segment}' while resolving '{path}'")]
    PathConflict { path: String, segment: String },

    #[error("Invalid sheet format: {0}")]
    InvalidFormat(String),

    #[error("Attribute not found: {path}")]
    AttributeNotFound { path: String },

    #[error("Invalid attribute path: '{0}'")]
    InvalidPath(String),

    #[error("Malformed field '{path}': expected {expected}")]
    MalformedField {
        path: String,
        expected: &'static str,
    },

    #[error("Unknown denomination: '{0}'")]
    UnknownDenomination(String),

    #[error("Invalid user key: '{0}'")]
    InvalidUserKey(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Flat error category for the command layer to phrase replies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetErrorKind {
    NotFound,
    CorruptDocument,
    InvalidExpression,
    InsufficientFunds,
    InsufficientResource,
    InvalidAmount,
    PathConflict,
    InvalidFormat,
    InvalidPath,
    MalformedField,
    UnknownDenomination,
    InvalidUserKey,
    Storage,
}

impl SheetErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::CorruptDocument => "corrupt_document",
            Self::InvalidExpression => "invalid_expression",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InsufficientResource => "insufficient_resource",
            Self::InvalidAmount => "invalid_amount",
            Self::PathConflict => "path_conflict",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidPath => "invalid_path",
            Self::MalformedField => "malformed_field",
            Self::UnknownDenomination => "unknown_denomination",
            Self::InvalidUserKey => "invalid_user_key",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for SheetErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SheetError {
    pub fn kind(&self) -> SheetErrorKind {
        match self {
            Self::CharacterNotFound(_) | Self::AttributeNotFound { .. } => SheetErrorKind::NotFound,
            Self::CorruptDocument { .. } => SheetErrorKind::CorruptDocument,
            Self::InvalidExpression(_) => SheetErrorKind::InvalidExpression,
            Self::InsufficientFunds { .. } => SheetErrorKind::InsufficientFunds,
            Self::InsufficientResource { .. } => SheetErrorKind::InsufficientResource,
            Self::InvalidAmount(_) => SheetErrorKind::InvalidAmount,
            Self::PathConflict { .. } => SheetErrorKind::PathConflict,
            Self::InvalidFormat(_) => SheetErrorKind::InvalidFormat,
            Self::InvalidPath(_) => SheetErrorKind::InvalidPath,
            Self::MalformedField { .. } => SheetErrorKind::MalformedField,
            Self::UnknownDenomination(_) => SheetErrorKind::UnknownDenomination,
            Self::InvalidUserKey(_) => SheetErrorKind::InvalidUserKey,
            Self::Storage(_) => SheetErrorKind::Storage,
        }
    }

    /// Attach the user key to a storage failure.
    pub fn from_repo(key: &UserKey, error: RepoError) -> Self {
        match error {
            RepoError::NotFound { .. } => Self::CharacterNotFound(key.clone()),
            RepoError::Corrupt { message, .. } => Self::CorruptDocument {
                key: key.clone(),
                message,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<DomainError> for SheetError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InsufficientFunds {
                requested_cp,
                available_cp,
            } => Self::InsufficientFunds {
                requested_cp,
                available_cp,
            },
            DomainError::InsufficientResource {
                requested,
                available,
            } => Self::InsufficientResource {
                requested,
                available,
            },
            DomainError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            DomainError::PathConflict { path, segment } => Self::PathConflict { path, segment },
            DomainError::AttributeNotFound { path } => Self::AttributeNotFound { path },
            DomainError::InvalidPath(path) => Self::InvalidPath(path),
            DomainError::MalformedField { path, expected } => {
                Self::MalformedField { path, expected }
            }
            DomainError::InvalidExpression(e) => Self::InvalidExpression(e),
            DomainError::UnknownDenomination(code) => Self::UnknownDenomination(code),
            DomainError::InvalidUserKey(key) => Self::InvalidUserKey(key),
        }
    }
}

impl From<DiceParseError> for SheetError {
    fn from(error: DiceParseError) -> Self {
        Self::InvalidExpression(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_with_key() {
        let key = UserKey::from(3_u64);
        let err = SheetError::from_repo(&key, RepoError::not_found("CharacterDocument", &key));
        assert!(matches!(err, SheetError::CharacterNotFound(ref k) if *k == key));
        assert_eq!(err.kind(), SheetErrorKind::NotFound);

        let err = SheetError::from_repo(&key, RepoError::corrupt(&key, "bad json"));
        assert_eq!(err.kind(), SheetErrorKind::CorruptDocument);

        let err = SheetError::from_repo(&key, RepoError::io("rename", "disk full"));
        assert_eq!(err.kind(), SheetErrorKind::Storage);
    }

    #[test]
    fn domain_errors_keep_their_kind() {
        let err = SheetError::from(DomainError::attribute_not_found("skills.stealth"));
        assert_eq!(err.kind(), SheetErrorKind::NotFound);

        let err = SheetError::from(DomainError::path_conflict("a.b", "a"));
        assert_eq!(err.kind(), SheetErrorKind::PathConflict);

        let err = SheetError::from(DomainError::InvalidExpression(DiceParseError::Empty));
        assert_eq!(err.kind(), SheetErrorKind::InvalidExpression);

        let err = SheetError::from(DomainError::UnknownDenomination("pp".into()));
        assert_eq!(err.kind(), SheetErrorKind::UnknownDenomination);

        let err = SheetError::from(DomainError::InvalidPath("a..b".into()));
        assert_eq!(err.kind(), SheetErrorKind::InvalidPath);

        let err = SheetError::from(DomainError::malformed("hit_points.max", "integer"));
        assert_eq!(err.kind(), SheetErrorKind::MalformedField);

        let err = SheetError::from(DomainError::InvalidUserKey("../x".into()));
        assert_eq!(err.kind(), SheetErrorKind::InvalidUserKey);
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(SheetErrorKind::InsufficientFunds.as_str(), "insufficient_funds");
        assert_eq!(SheetErrorKind::NotFound.to_string(), "not_found");
    }
}
