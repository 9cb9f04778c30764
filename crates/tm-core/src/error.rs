//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Migration label is empty or contains unsupported characters
    #[error("[C001] Invalid migration label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    /// C002: String is not a `<timestamp>_<label>` migration name
    #[error("[C002] Invalid migration name '{name}': expected <YYYYMMDDHHMMSS>_<label>")]
    InvalidName { name: String },

    /// C003: Failed to parse the project configuration
    #[error("[C003] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C004: IO error while reading the project configuration
    #[error("[C004] IO error reading {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
