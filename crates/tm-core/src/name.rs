//! Timestamped migration names.
//!
//! A migration name is `<YYYYMMDDHHMMSS>_<label>`. The timestamp is UTC and
//! fixed width, so sorting names lexically sorts them chronologically.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

/// chrono format of the timestamp prefix.
pub const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Width of the timestamp prefix.
const STAMP_WIDTH: usize = 14;

/// Last stamp (unix seconds) handed out by [`MigrationName::construct`].
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

fn label_pattern() -> &'static Regex {
    static LABEL_RE: OnceLock<Regex> = OnceLock::new();
    LABEL_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"))
}

fn name_pattern() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| Regex::new(r"^[0-9]{14}_[A-Za-z0-9_]+$").expect("valid regex"))
}

/// Check that `label` can be used as the user part of a migration name.
///
/// Labels end up as directory names and inside generated Rust identifiers,
/// so only ASCII letters, digits and underscores are accepted.
pub fn validate_label(label: &str) -> CoreResult<()> {
    if label.is_empty() {
        return Err(CoreError::InvalidLabel {
            label: String::new(),
            reason: "migration name cannot be empty".to_string(),
        });
    }
    if !label_pattern().is_match(label) {
        return Err(CoreError::InvalidLabel {
            label: label.to_string(),
            reason: "only ASCII letters, digits and '_' are allowed".to_string(),
        });
    }
    Ok(())
}

/// Reserve the next stamp: `now`, or one second past the previous stamp if
/// that one is not older than `now`.
fn next_stamp(now: i64) -> i64 {
    let mut last = LAST_STAMP.load(Ordering::SeqCst);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Strongly-typed `<timestamp>_<label>` migration name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationName(String);

impl<'de> Deserialize<'de> for MigrationName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationName::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl MigrationName {
    /// Build a fresh name for `label` stamped with the current UTC time.
    ///
    /// Stamps never repeat within a process: two calls in the same second
    /// get consecutive seconds.
    pub fn construct(label: &str) -> CoreResult<Self> {
        validate_label(label)?;
        let stamp = next_stamp(Utc::now().timestamp());
        let at = DateTime::<Utc>::from_timestamp(stamp, 0).ok_or_else(|| {
            CoreError::InvalidName {
                name: format!("{stamp}_{label}"),
            }
        })?;
        Ok(Self(format!("{}_{}", at.format(STAMP_FORMAT), label)))
    }

    /// Parse an existing migration name (e.g. a directory name).
    pub fn parse(name: &str) -> CoreResult<Self> {
        if !name_pattern().is_match(name) {
            return Err(CoreError::InvalidName {
                name: name.to_string(),
            });
        }
        let parsed = Self(name.to_string());
        NaiveDateTime::parse_from_str(parsed.stamp(), STAMP_FORMAT).map_err(|_| {
            CoreError::InvalidName {
                name: name.to_string(),
            }
        })?;
        Ok(parsed)
    }

    fn stamp(&self) -> &str {
        &self.0[..STAMP_WIDTH]
    }

    /// The user-supplied part after the timestamp.
    pub fn label(&self) -> &str {
        &self.0[STAMP_WIDTH + 1..]
    }

    /// The timestamp prefix as a UTC datetime.
    pub fn timestamp(&self) -> NaiveDateTime {
        // parse() and construct() both guarantee a well-formed stamp
        NaiveDateTime::parse_from_str(self.stamp(), STAMP_FORMAT).unwrap_or_default()
    }

    /// Rust module identifier used for this migration in generated code.
    pub fn module_ident(&self) -> String {
        format!("m{}", self.0)
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for MigrationName {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MigrationName {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "name_test.rs"]
mod tests;
