//! Error types for counters

use thiserror::Error;

/// Result type alias for counters operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for query building and storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// Constraint violation (unique, foreign key, check, not null)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Incomplete builder input (INSERT without rows, UPDATE without SET)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The blocking worker behind an async call failed
    #[error("Background task failed: {0}")]
    Join(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a constraint violation
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Parse a rusqlite error into a more specific StoreError
    pub fn from_db_error(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
            return Self::Constraint(err.to_string());
        }
        Self::Query(err)
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message() {
        let err = StoreError::validation("Incomplete input in INSERT");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: Incomplete input in INSERT");
    }

    #[test]
    fn non_constraint_driver_error_stays_query() {
        let err = StoreError::from_db_error(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StoreError::Query(_)));
    }
}
