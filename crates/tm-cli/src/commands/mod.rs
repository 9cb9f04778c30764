//! CLI command implementations

pub(crate) mod add;
pub(crate) mod clean;
pub(crate) mod common;
pub(crate) mod init;
pub(crate) mod migrate;
pub(crate) mod remove;
pub(crate) mod status;
