//! tm-db - Connection manager for Tidemark
//!
//! Owns the single DuckDB session a migrator works through: connection
//! string parsing, statement logging, and transaction primitives.

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConnectionConfig, Target};
pub use error::{DbError, DbResult};
pub use session::Session;
