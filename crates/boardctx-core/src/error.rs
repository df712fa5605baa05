//! Error types for context resolution.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the whole boardctx workspace.
///
/// The first four variants form the resolution taxonomy: what the
/// controller does after a failure depends on which of them it sees.
/// The remaining variants come from storage and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContextError {
    /// The referenced entity no longer exists.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The entity exists but the user or team has no access to it.
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// A remote listing or lookup failed; retry is caller-driven.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Recovery did not converge (e.g. a corrected context failed again).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContextError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a TransientNetwork error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetwork(message.into())
    }

    /// Creates an InvariantViolation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Forbidden error
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Check if this is a TransientNetwork error
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ContextError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ContextError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ContextError>`.
pub type Result<T> = std::result::Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(ContextError::not_found("project", "p1").is_not_found());
        assert!(ContextError::forbidden("no access").is_forbidden());
        assert!(ContextError::transient("timeout").is_transient());
        assert!(!ContextError::internal("boom").is_transient());
    }

    #[test]
    fn test_not_found_message() {
        let err = ContextError::not_found("project", "p9");
        assert_eq!(err.to_string(), "Entity not found: project 'p9'");
    }

    #[test]
    fn test_json_error_conversion() {
        let err: ContextError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_serialization());
    }
}
