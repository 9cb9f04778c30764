//! Connection string parsing.
//!
//! Accepted forms:
//!
//! - `duckdb://path/to/file.duckdb`
//! - `path/to/file.duckdb`
//! - `:memory:` or `duckdb://:memory:`
//!
//! Any form may carry `?key=value&key=value` options, which are handed to
//! DuckDB's configuration unchanged (e.g. `threads=4`).

use crate::error::{DbError, DbResult};
use std::fmt;
use std::path::{Path, PathBuf};

const SCHEME: &str = "duckdb";
const MEMORY: &str = ":memory:";

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Private in-memory database, gone when the session closes
    Memory,
    /// Database file on disk
    File(PathBuf),
}

/// Parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub target: Target,
    pub options: Vec<(String, String)>,
}

impl ConnectionConfig {
    /// Config for a fresh in-memory database.
    pub fn memory() -> Self {
        Self {
            target: Target::Memory,
            options: Vec::new(),
        }
    }

    /// Config for a database file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
            options: Vec::new(),
        }
    }

    /// Parse a connection string.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DbError::ConnectionError(
                "connection string is empty".to_string(),
            ));
        }

        let rest = match raw.split_once("://") {
            Some((SCHEME, rest)) => rest,
            Some((scheme, _)) => {
                return Err(DbError::ConnectionError(format!(
                    "unsupported scheme '{scheme}' in '{raw}', expected {SCHEME}://"
                )))
            }
            None => raw,
        };

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let target = match location {
            "" => {
                return Err(DbError::ConnectionError(format!(
                    "missing database path in '{raw}'"
                )))
            }
            MEMORY => Target::Memory,
            path => Target::File(PathBuf::from(path)),
        };

        let mut options = Vec::new();
        for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    options.push((key.to_string(), value.to_string()));
                }
                _ => {
                    return Err(DbError::ConnectionError(format!(
                        "malformed option '{pair}' in '{raw}', expected key=value"
                    )))
                }
            }
        }

        Ok(Self { target, options })
    }

    /// Path of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path),
            Target::Memory => None,
        }
    }

    /// Render back into a string accepted by [`ConnectionConfig::parse`].
    pub fn to_connection_string(&self) -> String {
        self.to_string()
    }

    /// Build the DuckDB configuration carrying the parsed options.
    pub(crate) fn duckdb_config(&self) -> DbResult<duckdb::Config> {
        self.options
            .iter()
            .try_fold(duckdb::Config::default(), |config, (key, value)| {
                config.with(key, value).map_err(|e| {
                    DbError::ConnectionError(format!("invalid option {key}={value}: {e}"))
                })
            })
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::Memory => write!(f, "{SCHEME}://{MEMORY}")?,
            Target::File(path) => write!(f, "{SCHEME}://{}", path.display())?,
        }
        for (i, (key, value)) in self.options.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_path() {
        let config = ConnectionConfig::parse("duckdb://data/app.duckdb").unwrap();
        assert_eq!(config.target, Target::File(PathBuf::from("data/app.duckdb")));
        assert!(config.options.is_empty());
    }

    #[test]
    fn parses_bare_path_and_memory() {
        assert_eq!(
            ConnectionConfig::parse("app.duckdb").unwrap(),
            ConnectionConfig::file("app.duckdb")
        );
        assert_eq!(
            ConnectionConfig::parse(":memory:").unwrap(),
            ConnectionConfig::memory()
        );
        assert_eq!(
            ConnectionConfig::parse("duckdb://:memory:").unwrap(),
            ConnectionConfig::memory()
        );
    }

    #[test]
    fn parses_options() {
        let config =
            ConnectionConfig::parse("duckdb:///tmp/x.duckdb?threads=2&access_mode=read_write")
                .unwrap();
        assert_eq!(config.path(), Some(Path::new("/tmp/x.duckdb")));
        assert_eq!(
            config.options,
            vec![
                ("threads".to_string(), "2".to_string()),
                ("access_mode".to_string(), "read_write".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_bad_strings() {
        for raw in [
            "",
            "   ",
            "postgres://localhost/db",
            "duckdb://",
            "duckdb://x.duckdb?threads",
            "duckdb://x.duckdb?=4",
        ] {
            let err = ConnectionConfig::parse(raw).unwrap_err();
            assert!(
                matches!(err, DbError::ConnectionError(_)),
                "{raw:?} should be a connection error"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for raw in [
            "duckdb://:memory:",
            "duckdb://db/app.duckdb",
            "duckdb://db/app.duckdb?threads=1&access_mode=read_write",
        ] {
            let config = ConnectionConfig::parse(raw).unwrap();
            assert_eq!(config.to_connection_string(), raw);
            assert_eq!(ConnectionConfig::parse(&config.to_string()).unwrap(), config);
        }
    }
}
