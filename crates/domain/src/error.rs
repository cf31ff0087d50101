//! Unified error types for the domain layer
//!
//! Every rule the character sheet enforces reports through [`DomainError`],
//! so adapters can map a failure to a user-facing message without parsing strings.

use thiserror::Error;

use crate::value_objects::DiceParseError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A withdrawal would take the balance below zero
    #[error("Insufficient funds: requested {requested_cp} cp, available {available_cp} cp")]
    InsufficientFunds { requested_cp: i64, available_cp: i64 },

    /// A spend would exceed a tracked resource pool
    #[error("Insufficient resource: requested {requested}, available {available}")]
    InsufficientResource { requested: i64, available: i64 },

    /// A numeric input is outside the accepted range
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// A path walks through a value that is not a mapping
    #[error("Path conflict at '{segment}' while resolving '{path}'")]
    PathConflict { path: String, segment: String },

    /// No value lives at the path
    #[error("Attribute not found: {path}")]
    AttributeNotFound { path: String },

    /// The path string itself is unusable (empty, or an empty segment)
    #[error("Invalid attribute path: '{0}'")]
    InvalidPath(String),

    /// A well-known field holds a value of the wrong shape
    #[error("Malformed field '{path}': expected {expected}")]
    MalformedField {
        path: String,
        expected: &'static str,
    },

    /// Dice notation could not be parsed or rolled
    #[error("Invalid dice expression: {0}")]
    InvalidExpression(#[from] DiceParseError),

    /// Coin code outside gp/sp/cp
    #[error("Unknown denomination: '{0}'")]
    UnknownDenomination(String),

    /// User key contains characters that cannot name a document
    #[error("Invalid user key: '{0}'")]
    InvalidUserKey(String),
}

impl DomainError {
    /// Create an attribute-not-found error
    pub fn attribute_not_found(path: impl Into<String>) -> Self {
        Self::AttributeNotFound { path: path.into() }
    }

    /// Create a malformed field error
    pub fn malformed(path: impl Into<String>, expected: &'static str) -> Self {
        Self::MalformedField {
            path: path.into(),
            expected,
        }
    }

    /// Create a path conflict error
    pub fn path_conflict(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::PathConflict {
            path: path.into(),
            segment: segment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let err = DomainError::InsufficientFunds {
            requested_cp: 500,
            available_cp: 120,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 500 cp, available 120 cp"
        );
    }

    #[test]
    fn test_attribute_not_found_names_path() {
        let err = DomainError::attribute_not_found("skills.athletics");
        assert!(matches!(err, DomainError::AttributeNotFound { .. }));
        assert!(err.to_string().contains("skills.athletics"));
    }

    #[test]
    fn test_dice_error_converts() {
        let err: DomainError = DiceParseError::Empty.into();
        assert!(matches!(err, DomainError::InvalidExpression(DiceParseError::Empty)));
    }
}
