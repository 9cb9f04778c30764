//! Error types for tm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {message}")]
    ExecutionError { sql: String, message: String },

    /// Transaction control error (D003)
    #[error("[D003] Transaction failed: {0}")]
    TransactionError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Statement text that triggered the error, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            DbError::ExecutionError { sql, .. } => Some(sql),
            _ => None,
        }
    }
}
