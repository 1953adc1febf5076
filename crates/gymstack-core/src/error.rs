//! Unified application error types for GymStack.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The persistence layer maps every
//! sqlx error into one of these kinds at the store boundary, so callers
//! above the repositories never see a raw driver error.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found.
    NotFound,
    /// A uniqueness or referential constraint was violated.
    Conflict,
    /// Input validation failed.
    Validation,
    /// A bounded operation exceeded its configured time budget.
    Timeout,
    /// The store aborted the transaction (serialization failure, deadlock).
    /// The whole unit of work may be retried by the caller.
    TransactionAborted,
    /// A transaction scope was used outside the unit of work that owns it.
    /// This is a programming error, not a runtime condition to handle.
    InvalidScopeUse,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether a failed unit of work may be retried from scratch.
    ///
    /// Only coordinator-generated kinds qualify; business errors such as
    /// [`ErrorKind::NotFound`] or [`ErrorKind::Conflict`] will fail the
    /// same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::TransactionAborted)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::TransactionAborted => write!(f, "TRANSACTION_ABORTED"),
            Self::InvalidScopeUse => write!(f, "INVALID_SCOPE_USE"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout GymStack.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a transaction-aborted error.
    pub fn transaction_aborted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransactionAborted, message)
    }

    /// Create an invalid-scope-use error.
    pub fn invalid_scope_use(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidScopeUse, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is eligible for a caller-initiated retry of the
    /// whole unit of work.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(AppError::timeout("slow").is_retryable());
        assert!(AppError::transaction_aborted("40001").is_retryable());
        assert!(!AppError::not_found("missing").is_retryable());
        assert!(!AppError::conflict("dup").is_retryable());
        assert!(!AppError::invalid_scope_use("stale").is_retryable());
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::not_found("user 42 not found");
        assert_eq!(err.to_string(), "NOT_FOUND: user 42 not found");
    }
}
