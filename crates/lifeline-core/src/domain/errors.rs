//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! validation of inbound values and of the configuration applied at `init`.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::MissingField("crash_reporting.api_key".to_string());
        assert_eq!(err.to_string(), "Missing required field: crash_reporting.api_key");

        let err = DomainError::ValidationFailed("unknown lifecycle signal 'x'".to_string());
        assert_eq!(err.to_string(), "Validation failed: unknown lifecycle signal 'x'");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::ValidationFailed("x".to_string());
        let err2 = DomainError::ValidationFailed("x".to_string());
        let err3 = DomainError::ValidationFailed("y".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
