//! Error types for tm-version

use thiserror::Error;
use tm_db::DbError;

/// Versioning service errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// The `_tidemark` schema does not exist yet (V001)
    #[error("[V001] Current version unavailable: migrations are not initialized, run `tm init`")]
    Uninitialized,

    /// No migration registered under this name (V002)
    #[error("[V002] Migration not registered: {name}")]
    NotFound { name: String },

    /// Migration is not next in line for the requested move (V003)
    #[error("[V003] Cannot {direction} {name} (version {version}) while at version {current}")]
    OutOfOrder {
        name: String,
        direction: String,
        version: i64,
        current: i64,
    },

    /// Migration is applied and cannot be removed (V004)
    #[error("[V004] Migration {name} is applied (version {version}, current {current}); downgrade before removing it")]
    Applied {
        name: String,
        version: i64,
        current: i64,
    },

    /// Target version cannot be reached from the current one (V005)
    #[error("[V005] Version {target} is unreachable from {current}: {reason}")]
    Unreachable {
        current: i64,
        target: i64,
        reason: String,
    },

    /// A stored row could not be decoded (V006)
    #[error("[V006] Malformed versioning record: {0}")]
    Malformed(String),

    /// Underlying database failure (V007)
    #[error("[V007] Versioning service call failed: {0}")]
    Db(#[from] DbError),
}

/// Result type alias for VersionError
pub type VersionResult<T> = Result<T, VersionError>;
