//! tm-engine - Migration orchestration engine for Tidemark
//!
//! [`Migrator`] ties the pieces together: it owns the database session,
//! keeps the on-disk migration layout and the versioning service in step,
//! and moves the version pointer by applying migrations in-process through
//! the [`Applier`] or by building and running a generated runner program.

pub mod applier;
pub mod assembler;
pub mod error;
pub mod layout;
pub mod migrator;
pub mod oracle;

pub use applier::Applier;
pub use assembler::{Assembler, RunnerPlan, CONNECTION_ENV};
pub use error::{EngineError, EngineResult};
pub use layout::MigrationLayout;
pub use migrator::{
    AddedMigration, CleanOutcome, GeneratedRunner, InitOutcome, MigrationStatus, Migrator,
    MigratorOptions, Status,
};
pub use oracle::{BuildOracle, CargoOracle, RunOutput, RunnerInvocation};

pub use tm_core::{Direction, ExecutionMode, Migration, MigrationName};
pub use tm_db::Session;
