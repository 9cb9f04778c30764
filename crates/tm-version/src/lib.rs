//! tm-version - Versioning service client for Tidemark
//!
//! The versioning service keeps migration registrations, the current version
//! pointer and the audit history in the `_tidemark` schema of the target
//! database. [`VersionClient`] is the only way the rest of Tidemark talks to
//! it.

pub mod client;
pub mod ddl;
pub mod error;

pub use client::VersionClient;
pub use error::{VersionError, VersionResult};
