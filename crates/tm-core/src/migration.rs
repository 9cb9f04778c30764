//! Migration records, directions and history entries.

use crate::name::MigrationName;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A migration registered with the versioning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Surrogate key assigned on registration
    pub id: i64,

    /// `<timestamp>_<label>` name, unique
    pub name: MigrationName,

    /// When the migration was registered
    pub registered_at: NaiveDateTime,

    /// Position in the version sequence (1-based, contiguous)
    pub version: i64,
}

impl Migration {
    /// Whether this migration is covered by the version pointer `current`.
    pub fn is_applied(&self, current: i64) -> bool {
        self.version <= current
    }
}

/// Direction of travel through the version sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply migrations, moving the pointer forward
    Up,
    /// Revert migrations, moving the pointer back
    Down,
}

impl Direction {
    /// Name of the entry point in a generated `migrate.rs` and of the
    /// direction in the history table.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// SQL file holding the migration body for this direction.
    pub fn sql_file(self) -> &'static str {
        match self {
            Direction::Up => "up.sql",
            Direction::Down => "down.sql",
        }
    }

    /// Past-tense verb for log lines.
    pub fn verb(self) -> &'static str {
        match self {
            Direction::Up => "upgraded",
            Direction::Down => "downgraded",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("unknown migration direction '{other}'")),
        }
    }
}

/// One row of the audit history: a migration applied or reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub migration: String,
    pub direction: Direction,
    pub from_version: i64,
    pub to_version: i64,
    pub applied_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_str() {
        for dir in [Direction::Up, Direction::Down] {
            assert_eq!(dir.as_str().parse::<Direction>().unwrap(), dir);
        }
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_files() {
        assert_eq!(Direction::Up.sql_file(), "up.sql");
        assert_eq!(Direction::Down.sql_file(), "down.sql");
    }

    #[test]
    fn migration_serializes_as_json_record() {
        let json = r#"{
            "id": 7,
            "name": "20240102030405_create_users",
            "registered_at": "2024-01-02T03:04:05",
            "version": 3
        }"#;
        let migration: Migration = serde_json::from_str(json).unwrap();
        assert_eq!(migration.id, 7);
        assert_eq!(migration.name.label(), "create_users");
        assert_eq!(migration.version, 3);
        assert!(migration.is_applied(3));
        assert!(!migration.is_applied(2));
    }
}
