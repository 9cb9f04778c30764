//! Database session.
//!
//! [`Session`] owns one DuckDB [`Connection`] for the lifetime of a migrator.
//! Every statement goes through it so that each one is logged at `info` and
//! each failure at `error` together with the statement text.

use crate::config::{ConnectionConfig, Target};
use crate::error::{DbError, DbResult};
use duckdb::{Connection, Params, Row};

/// A single database session.
///
/// Single-threaded: operations run one at a time on the caller's thread.
pub struct Session {
    conn: Connection,
    config: ConnectionConfig,
}

fn open(config: &ConnectionConfig) -> DbResult<Connection> {
    let flags = config.duckdb_config()?;
    match &config.target {
        Target::Memory => Connection::open_in_memory_with_flags(flags)
            .map_err(|e| DbError::ConnectionError(e.to_string())),
        Target::File(path) => Connection::open_with_flags(path, flags)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display()))),
    }
}

impl Session {
    /// Parse `connection_string` and open a session.
    pub fn connect(connection_string: &str) -> DbResult<Self> {
        Self::open(ConnectionConfig::parse(connection_string)?)
    }

    /// Open a session from an already parsed config.
    pub fn open(config: ConnectionConfig) -> DbResult<Self> {
        let conn = open(&config)?;
        log::debug!("Connected to {config}");
        Ok(Self { conn, config })
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Self::open(ConnectionConfig::memory())
    }

    /// Connection settings this session was opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn failed(&self, sql: &str, err: duckdb::Error) -> DbError {
        log::error!("Error executing {sql}: {err}");
        DbError::ExecutionError {
            sql: sql.to_string(),
            message: err.to_string(),
        }
    }

    /// Execute one statement, returning the number of affected rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> DbResult<usize> {
        log::info!("Executing SQL: {sql}");
        self.conn
            .execute(sql, params)
            .map_err(|e| self.failed(sql, e))
    }

    /// Execute a batch of `;`-separated statements.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        log::info!("Executing SQL: {sql}");
        self.conn
            .execute_batch(sql)
            .map_err(|e| self.failed(sql, e))
    }

    /// Run a query expected to return exactly one row.
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, map: F) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> duckdb::Result<T>,
    {
        log::info!("Executing SQL: {sql}");
        self.conn
            .query_row(sql, params, map)
            .map_err(|e| self.failed(sql, e))
    }

    /// Run a query and map every row.
    pub fn query_map<T, P, F>(&self, sql: &str, params: P, map: F) -> DbResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> duckdb::Result<T>,
    {
        log::info!("Executing SQL: {sql}");
        let mut stmt = self.conn.prepare(sql).map_err(|e| self.failed(sql, e))?;
        let rows = stmt
            .query_map(params, map)
            .map_err(|e| self.failed(sql, e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.failed(sql, e))
    }

    /// Start a transaction.
    pub fn begin(&self) -> DbResult<()> {
        self.control("BEGIN TRANSACTION")
    }

    /// Commit the open transaction.
    pub fn commit(&self) -> DbResult<()> {
        self.control("COMMIT")
    }

    /// Roll back the open transaction.
    pub fn rollback(&self) -> DbResult<()> {
        self.control("ROLLBACK")
    }

    fn control(&self, sql: &str) -> DbResult<()> {
        log::info!("Executing SQL: {sql}");
        self.conn.execute_batch(sql).map_err(|e| {
            log::error!("Error executing {sql}: {e}");
            DbError::TransactionError(format!("{sql} failed: {e}"))
        })
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error or when the commit itself fails.
    pub fn transaction<F, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Session) -> Result<T, E>,
        E: From<DbError>,
    {
        self.begin()?;

        match body(self) {
            Ok(value) => {
                if let Err(commit_err) = self.commit() {
                    let _ = self.rollback();
                    return Err(commit_err.into());
                }
                Ok(value)
            }
            Err(err) => {
                let _ = self.rollback();
                Err(err)
            }
        }
    }

    /// Close the connection, run `f`, then reconnect.
    ///
    /// DuckDB holds an exclusive lock on a database file while it is open, so
    /// another process can only use the file while this session lets go of
    /// it. In-memory databases cannot be shared and are rejected.
    pub fn release_while<T, F>(&mut self, f: F) -> DbResult<T>
    where
        F: FnOnce() -> T,
    {
        let path = match &self.config.target {
            Target::File(path) => path.clone(),
            Target::Memory => {
                return Err(DbError::ConnectionError(
                    "an in-memory database cannot be shared with another process".to_string(),
                ))
            }
        };

        let placeholder = Connection::open_in_memory()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let conn = std::mem::replace(&mut self.conn, placeholder);
        if let Err((conn, e)) = conn.close() {
            self.conn = conn;
            return Err(DbError::ConnectionError(format!(
                "failed to release {}: {e}",
                path.display()
            )));
        }
        log::debug!("Released {}", path.display());

        let out = f();

        self.conn = open(&self.config)?;
        log::debug!("Reconnected to {}", path.display());
        Ok(out)
    }

    /// Close the session.
    pub fn close(self) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::ConnectionError(format!("close failed: {e}")))
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
