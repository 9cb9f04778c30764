//! Error types for tm-engine

use std::path::{Path, PathBuf};
use thiserror::Error;
use tm_core::{CoreError, Direction};
use tm_db::DbError;
use tm_version::VersionError;

/// Migration engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Database unreachable or connection string unusable (T001)
    #[error("[T001] Database connection failed: {0}")]
    Connection(String),

    /// Missing or invalid input, rejected before any side effect (T002)
    #[error("[T002] Invalid input: {0}")]
    Validation(String),

    /// Another migration already uses the label (T003)
    #[error("[T003] Migration {existing} already exists with label '{label}'")]
    Duplicate { label: String, existing: String },

    /// A versioning service call failed (T004)
    #[error("[T004] Versioning service error{}: {source}", context(.migration, .version))]
    Versioning {
        migration: Option<String>,
        version: Option<i64>,
        #[source]
        source: VersionError,
    },

    /// The migration's SQL body failed and was rolled back (T005)
    #[error("[T005] Error running {direction} for {migration} (version {version} -> {target}): {message}")]
    Execution {
        migration: String,
        direction: Direction,
        version: i64,
        target: i64,
        message: String,
    },

    /// The generated runner did not compile (T006)
    #[error("[T006] Runner build failed:\n{diagnostics}")]
    Build {
        version: Option<i64>,
        diagnostics: String,
    },

    /// The generated runner ran and exited unsuccessfully (T007)
    #[error("[T007] Runner exited with {status}:\n{output}")]
    RunnerFailed {
        version: i64,
        status: String,
        output: String,
    },

    /// Creating, reading or deleting migration files failed (T008)
    #[error("[T008] Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A code template failed to render (T009)
    #[error("[T009] Template rendering failed: {0}")]
    Template(String),

    /// Commit of a migration's transaction failed (T010)
    #[error("[T010] Transaction for {migration} failed at version {version}: {source}")]
    Transaction {
        migration: String,
        version: i64,
        #[source]
        source: DbError,
    },

    /// Other database failure (T011)
    #[error("[T011] Database error: {0}")]
    Database(#[source] DbError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;

fn context(migration: &Option<String>, version: &Option<i64>) -> String {
    match (migration, version) {
        (Some(m), Some(v)) => format!(" ({m}, at version {v})"),
        (Some(m), None) => format!(" ({m})"),
        (None, Some(v)) => format!(" (at version {v})"),
        (None, None) => String::new(),
    }
}

impl EngineError {
    /// Wrap a versioning service error with the migration and version it
    /// concerned.
    pub fn versioning(migration: Option<&str>, version: Option<i64>, source: VersionError) -> Self {
        EngineError::Versioning {
            migration: migration.map(str::to_string),
            version,
            source,
        }
    }

    /// Build a closure mapping an IO error at `path` into [`EngineError::Filesystem`].
    pub fn filesystem(path: &Path) -> impl FnOnce(std::io::Error) -> EngineError + '_ {
        move |source| EngineError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Version pointer still in effect after this failure, when known.
    pub fn version(&self) -> Option<i64> {
        match self {
            EngineError::Versioning { version, .. } | EngineError::Build { version, .. } => *version,
            EngineError::Execution { version, .. }
            | EngineError::RunnerFailed { version, .. }
            | EngineError::Transaction { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Fill in the version for errors raised where it was not known.
    pub fn with_version(self, current: i64) -> Self {
        match self {
            EngineError::Versioning {
                migration,
                version: None,
                source,
            } => EngineError::Versioning {
                migration,
                version: Some(current),
                source,
            },
            EngineError::Build {
                version: None,
                diagnostics,
            } => EngineError::Build {
                version: Some(current),
                diagnostics,
            },
            other => other,
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(message) => EngineError::Connection(message),
            other => EngineError::Database(other),
        }
    }
}

impl From<VersionError> for EngineError {
    fn from(err: VersionError) -> Self {
        EngineError::versioning(None, None, err)
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<minijinja::Error> for EngineError {
    fn from(err: minijinja::Error) -> Self {
        EngineError::Template(err.to_string())
    }
}
