//! Embedded DDL for the versioning service.
//!
//! Both scripts are embedded via `include_str!` and executed as a single
//! batch by [`crate::VersionClient::initialize`] and
//! [`crate::VersionClient::teardown`].

/// Schema holding the versioning tables.
pub const SCHEMA: &str = "_tidemark";

/// Creates the versioning schema, tables and the version pointer row.
pub static INIT_SQL: &str = include_str!("init.sql");

/// Drops everything [`INIT_SQL`] created.
pub static CLEAN_SQL: &str = include_str!("clean.sql");
