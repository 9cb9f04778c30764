//! tm-core - Core library for Tidemark
//!
//! Shared types used by every other crate: the migration record and its
//! timestamped name, migration direction, history entries, and the
//! `tidemark.yml` project configuration.

pub mod config;
pub mod error;
pub mod migration;
pub mod name;

pub use config::{Config, ExecutionMode, RunnerConfig};
pub use error::{CoreError, CoreResult};
pub use migration::{Direction, HistoryEntry, Migration};
pub use name::{validate_label, MigrationName};
