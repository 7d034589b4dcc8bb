//! Error types for the progression engine.

use thiserror::Error;

/// Top-level error type for all progression operations.
#[derive(Error, Debug)]
pub enum ApprobError {
    /// An operation was called with arguments that violate its preconditions.
    #[error("Invalid argument to {operation}: {reason}")]
    InvalidArgument {
        /// Which operation rejected the input.
        operation: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A string did not name any known award reason.
    #[error("Unknown award action: {0}")]
    UnknownAction(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApprobError {
    /// Shorthand for building an [`ApprobError::InvalidArgument`].
    pub(crate) fn invalid(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    /// Whether this error is a rejected precondition rather than an
    /// infrastructure failure.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

impl From<serde_json::Error> for ApprobError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ApprobError>;
