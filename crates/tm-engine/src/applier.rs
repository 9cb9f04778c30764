//! Applies one migration's SQL body atomically with its version bump.
//!
//! The pointer update and the SQL body share one transaction: the database
//! never shows a schema change without the matching version, or the other
//! way round.

use crate::error::{EngineError, EngineResult};
use tm_core::Direction;
use tm_db::Session;
use tm_version::VersionClient;

/// Applies and reverts single migrations on a session.
///
/// Generated `migrate.rs` entry points call into this type, so its API is
/// also what the runner program compiles against.
pub struct Applier<'s> {
    session: &'s Session,
}

impl<'s> Applier<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Apply migration `name` with body `sql`, returning the new version.
    pub fn apply(&self, name: &str, sql: &str) -> EngineResult<i64> {
        self.run(name, sql, Direction::Up)
    }

    /// Revert migration `name` with body `sql`, returning the new version.
    pub fn revert(&self, name: &str, sql: &str) -> EngineResult<i64> {
        self.run(name, sql, Direction::Down)
    }

    fn run(&self, name: &str, sql: &str, direction: Direction) -> EngineResult<i64> {
        self.session.begin()?;

        let (old, new) = match self.steps(name, sql, direction) {
            Ok(versions) => versions,
            Err(err) => {
                let _ = self.session.rollback();
                return Err(err);
            }
        };

        if let Err(source) = self.session.commit() {
            let _ = self.session.rollback();
            return Err(EngineError::Transaction {
                migration: name.to_string(),
                version: old,
                source,
            });
        }

        log::info!("{} {name}: version {old} -> {new}", direction.verb());
        Ok(new)
    }

    /// Everything between BEGIN and COMMIT. Returns `(old, new)` versions.
    fn steps(&self, name: &str, sql: &str, direction: Direction) -> EngineResult<(i64, i64)> {
        let client = VersionClient::new(self.session);

        let old = client
            .current_version()
            .map_err(|e| EngineError::versioning(Some(name), None, e))?;

        let moved = match direction {
            Direction::Up => client.apply_version(name),
            Direction::Down => client.revert_version(name),
        };
        let new = moved.map_err(|e| EngineError::versioning(Some(name), Some(old), e))?;

        if sql.trim().is_empty() {
            log::warn!("{name}: {} is empty, only the version changes", direction.sql_file());
            return Ok((old, new));
        }

        self.session
            .execute_batch(sql)
            .map_err(|e| EngineError::Execution {
                migration: name.to_string(),
                direction,
                version: old,
                target: new,
                message: e.to_string(),
            })?;

        Ok((old, new))
    }
}

#[cfg(test)]
#[path = "applier_test.rs"]
mod tests;
