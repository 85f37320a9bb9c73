//! Error types for store and query construction

use thiserror::Error;

use crate::types::Command;

/// Reasons a [`QueryRequest`](crate::query::QueryRequest) cannot produce a statement
///
/// These are expected outcomes, not faults: [`QueryBuilder::build`](crate::query::QueryBuilder::build)
/// collapses them to `None`, while `try_build` hands them back for callers
/// that want to log or report the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Configuration incomplete: {0} is not set")]
    ConfigurationIncomplete(&'static str),

    #[error("Missing operands: {0} requires both a base object and a patch object")]
    MissingOperands(Command),
}

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query build error: {0}")]
    Build(#[from] BuildError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_messages() {
        assert_eq!(
            BuildError::ConfigurationIncomplete("command").to_string(),
            "Configuration incomplete: command is not set"
        );
        assert_eq!(
            BuildError::MissingOperands(Command::Insert).to_string(),
            "Missing operands: INSERT requires both a base object and a patch object"
        );
    }

    #[test]
    fn test_build_error_converts_into_store_error() {
        let err: StoreError = BuildError::ConfigurationIncomplete("entity").into();
        assert!(matches!(err, StoreError::Build(_)));
        assert!(err.to_string().contains("entity is not set"));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(StoreError::validation("x"), StoreError::Validation(_)));
        assert!(matches!(StoreError::not_found("x"), StoreError::NotFound(_)));
        assert!(matches!(StoreError::database("x"), StoreError::Database(_)));
        assert!(matches!(StoreError::config("x"), StoreError::Config(_)));
    }
}
