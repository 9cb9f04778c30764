//! Client for the versioning service call contract.
//!
//! Every call runs on the borrowed [`Session`], so a call made inside a
//! transaction the caller opened joins that transaction.

use crate::ddl::{CLEAN_SQL, INIT_SQL, SCHEMA};
use crate::error::{VersionError, VersionResult};
use chrono::NaiveDateTime;
use duckdb::{params, Row};
use tm_core::{Direction, HistoryEntry, Migration, MigrationName};
use tm_db::Session;

const CHECK_SCHEMA: &str =
    "SELECT COUNT(*) > 0 FROM information_schema.schemata WHERE schema_name = ?";
const FIND: &str = "SELECT id, name, CAST(registered_at AS VARCHAR), version \
     FROM _tidemark.migrations WHERE name = ?";
const LIST: &str = "SELECT id, name, CAST(registered_at AS VARCHAR), version \
     FROM _tidemark.migrations ORDER BY version";
const ADD: &str = "INSERT INTO _tidemark.migrations (name, version) VALUES (?, ?)";
const REMOVE: &str = "DELETE FROM _tidemark.migrations WHERE name = ?";
const RENUMBER: &str = "UPDATE _tidemark.migrations SET version = version - 1 WHERE version > ?";
const LATEST_VERSION: &str = "SELECT COALESCE(MAX(version), 0) FROM _tidemark.migrations";
const CURRENT_VERSION: &str = "SELECT current_version FROM _tidemark.version_pointer";
const SET_VERSION: &str =
    "UPDATE _tidemark.version_pointer SET current_version = ?, updated_at = current_timestamp";
const RECORD_HISTORY: &str = "INSERT INTO _tidemark.history \
     (migration, direction, from_version, to_version) VALUES (?, ?, ?, ?)";
const HISTORY: &str = "SELECT id, migration, direction, from_version, to_version, \
     CAST(applied_at AS VARCHAR) FROM _tidemark.history ORDER BY id DESC";
const DIFF_UP: &str = "SELECT name FROM _tidemark.migrations \
     WHERE version > ? AND version <= ? ORDER BY version";
const DIFF_DOWN: &str = "SELECT name FROM _tidemark.migrations \
     WHERE version <= ? AND version > ? ORDER BY version DESC";

/// Format DuckDB uses when casting a TIMESTAMP to VARCHAR.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

type MigrationRow = (i64, String, String, i64);

fn parse_timestamp(raw: &str) -> VersionResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| VersionError::Malformed(format!("timestamp '{raw}': {e}")))
}

fn decode_migration(
    (id, name, registered_at, version): MigrationRow,
) -> VersionResult<Migration> {
    let name =
        MigrationName::parse(&name).map_err(|e| VersionError::Malformed(e.to_string()))?;
    Ok(Migration {
        id,
        name,
        registered_at: parse_timestamp(&registered_at)?,
        version,
    })
}

fn migration_row(row: &Row<'_>) -> duckdb::Result<MigrationRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

/// Thin client over the versioning service.
pub struct VersionClient<'s> {
    session: &'s Session,
}

impl<'s> VersionClient<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// True once [`initialize`](Self::initialize) has run.
    pub fn schema_exists(&self) -> VersionResult<bool> {
        Ok(self
            .session
            .query_row(CHECK_SCHEMA, params![SCHEMA], |row| row.get(0))?)
    }

    fn require_schema(&self) -> VersionResult<()> {
        if self.schema_exists()? {
            Ok(())
        } else {
            Err(VersionError::Uninitialized)
        }
    }

    /// Create the versioning schema. Fails if it already exists.
    pub fn initialize(&self) -> VersionResult<()> {
        self.session.execute_batch(INIT_SQL)?;
        Ok(())
    }

    /// Drop the versioning schema and everything in it.
    pub fn teardown(&self) -> VersionResult<()> {
        self.session.execute_batch(CLEAN_SQL)?;
        Ok(())
    }

    /// Register `name` as the next version.
    ///
    /// Meant to run inside a transaction owned by the caller, who commits
    /// once the rest of the registration (files on disk) has succeeded.
    pub fn register_migration(&self, name: &MigrationName) -> VersionResult<Migration> {
        self.require_schema()?;
        let version = self.latest_version()? + 1;
        self.session.execute(ADD, params![name.as_str(), version])?;
        let migration = self.find(name)?.ok_or_else(|| VersionError::NotFound {
            name: name.to_string(),
        })?;
        log::debug!("Registered {} as version {}", migration.name, migration.version);
        Ok(migration)
    }

    /// Remove the registration for `name`, returning the removed record.
    ///
    /// Applied migrations are refused. Later versions move down by one so
    /// the sequence stays contiguous.
    pub fn deregister_migration(&self, name: &str) -> VersionResult<Migration> {
        self.require_schema()?;
        let migration = self.find(name)?.ok_or_else(|| VersionError::NotFound {
            name: name.to_string(),
        })?;
        let current = self.current_version()?;
        if migration.is_applied(current) {
            return Err(VersionError::Applied {
                name: name.to_string(),
                version: migration.version,
                current,
            });
        }

        self.session.execute(REMOVE, params![name])?;
        self.session.execute(RENUMBER, params![migration.version])?;
        log::debug!("Deregistered {} (was version {})", name, migration.version);
        Ok(migration)
    }

    /// Look up a registered migration by name.
    pub fn find(&self, name: &str) -> VersionResult<Option<Migration>> {
        let rows = self.session.query_map(FIND, params![name], migration_row)?;
        rows.into_iter().next().map(decode_migration).transpose()
    }

    /// All registered migrations, by version.
    pub fn migrations(&self) -> VersionResult<Vec<Migration>> {
        self.require_schema()?;
        self.session
            .query_map(LIST, [], migration_row)?
            .into_iter()
            .map(decode_migration)
            .collect()
    }

    /// Current value of the version pointer; 0 when nothing is applied.
    pub fn current_version(&self) -> VersionResult<i64> {
        self.require_schema()?;
        Ok(self.session.query_row(CURRENT_VERSION, [], |row| row.get(0))?)
    }

    /// Highest registered version; 0 when nothing is registered.
    pub fn latest_version(&self) -> VersionResult<i64> {
        self.require_schema()?;
        Ok(self.session.query_row(LATEST_VERSION, [], |row| row.get(0))?)
    }

    /// Move the pointer forward to `name`'s version and return it.
    ///
    /// `name` must be the migration right after the current version. Call
    /// this in the same transaction that executes the migration body.
    pub fn apply_version(&self, name: &str) -> VersionResult<i64> {
        let (migration, current) = self.locate(name)?;
        if migration.version != current + 1 {
            return Err(VersionError::OutOfOrder {
                name: name.to_string(),
                direction: "apply".to_string(),
                version: migration.version,
                current,
            });
        }
        self.move_pointer(name, Direction::Up, current, migration.version)?;
        Ok(migration.version)
    }

    /// Move the pointer back past `name` and return the new version.
    ///
    /// `name` must be the migration at the current version. Call this in
    /// the same transaction that executes the migration body.
    pub fn revert_version(&self, name: &str) -> VersionResult<i64> {
        let (migration, current) = self.locate(name)?;
        if migration.version != current {
            return Err(VersionError::OutOfOrder {
                name: name.to_string(),
                direction: "revert".to_string(),
                version: migration.version,
                current,
            });
        }
        let new_version = migration.version - 1;
        self.move_pointer(name, Direction::Down, current, new_version)?;
        Ok(new_version)
    }

    fn locate(&self, name: &str) -> VersionResult<(Migration, i64)> {
        let current = self.current_version()?;
        let migration = self.find(name)?.ok_or_else(|| VersionError::NotFound {
            name: name.to_string(),
        })?;
        Ok((migration, current))
    }

    fn move_pointer(
        &self,
        name: &str,
        direction: Direction,
        from: i64,
        to: i64,
    ) -> VersionResult<()> {
        self.session.execute(SET_VERSION, params![to])?;
        self.session
            .execute(RECORD_HISTORY, params![name, direction.as_str(), from, to])?;
        log::debug!("Version pointer {from} -> {to} ({direction} {name})");
        Ok(())
    }

    /// Ordered migrations to traverse from `old` to `target`.
    ///
    /// Ascending for [`Direction::Up`], descending for [`Direction::Down`];
    /// empty when `old == target`.
    pub fn diff(
        &self,
        old: i64,
        target: i64,
        direction: Direction,
    ) -> VersionResult<Vec<MigrationName>> {
        if old == target {
            return Ok(Vec::new());
        }
        let unreachable_from = |reason: String| VersionError::Unreachable {
            current: old,
            target,
            reason,
        };

        let names = match direction {
            Direction::Up => {
                if target < old {
                    return Err(unreachable_from(
                        "target is below the current version, downgrade instead".to_string(),
                    ));
                }
                let latest = self.latest_version()?;
                if target > latest {
                    return Err(unreachable_from(format!(
                        "latest registered version is {latest}"
                    )));
                }
                self.session
                    .query_map(DIFF_UP, params![old, target], |row| row.get::<_, String>(0))?
            }
            Direction::Down => {
                if target < 0 {
                    return Err(unreachable_from("versions start at 0".to_string()));
                }
                if target > old {
                    return Err(unreachable_from(
                        "target is above the current version, upgrade instead".to_string(),
                    ));
                }
                self.require_schema()?;
                self.session
                    .query_map(DIFF_DOWN, params![old, target], |row| row.get::<_, String>(0))?
            }
        };

        names
            .iter()
            .map(|name| {
                MigrationName::parse(name).map_err(|e| VersionError::Malformed(e.to_string()))
            })
            .collect()
    }

    /// Most recent history entries, newest first.
    pub fn history(&self, limit: usize) -> VersionResult<Vec<HistoryEntry>> {
        self.require_schema()?;
        let sql = format!("{HISTORY} LIMIT {limit}");
        let rows = self.session.query_map(&sql, [], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        rows.into_iter()
            .map(|(id, migration, direction, from_version, to_version, applied_at)| {
                Ok(HistoryEntry {
                    id,
                    migration,
                    direction: direction.parse().map_err(VersionError::Malformed)?,
                    from_version,
                    to_version,
                    applied_at: parse_timestamp(&applied_at)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
