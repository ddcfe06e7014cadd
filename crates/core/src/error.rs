//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Covers deterministic failures that are the caller's fault (malformed
/// quantities, malformed keys). Store and network failures belong to the
/// infrastructure layer and are never represented here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = DomainError::validation("required amount must be positive");
        assert_eq!(
            err.to_string(),
            "validation failed: required amount must be positive"
        );
    }

    #[test]
    fn constructors_pick_the_right_variant() {
        assert!(matches!(DomainError::invariant("x"), DomainError::InvariantViolation(_)));
        assert!(matches!(DomainError::invalid_id("x"), DomainError::InvalidId(_)));
    }
}
