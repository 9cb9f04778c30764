//! On-disk migration layout.
//!
//! Each migration lives in `<root>/<name>/` holding `up.sql`, `down.sql`
//! and the generated `migrate.rs` entry module.

use crate::error::{EngineError, EngineResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tm_core::{Direction, MigrationName};

/// SQL file applied when upgrading
pub const UP_SQL: &str = "up.sql";

/// SQL file applied when downgrading
pub const DOWN_SQL: &str = "down.sql";

/// Generated entry module of a migration
pub const ENTRY_FILE: &str = "migrate.rs";

/// Migrations directory on disk.
#[derive(Debug, Clone)]
pub struct MigrationLayout {
    root: PathBuf,
}

impl MigrationLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at `dir`, or at the current directory when `dir` is empty.
    pub fn resolve_root(dir: &Path) -> EngineResult<Self> {
        if dir.as_os_str().is_empty() {
            let cwd = std::env::current_dir().map_err(EngineError::filesystem(dir))?;
            return Ok(Self::new(cwd));
        }
        Ok(Self::new(dir))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, name: &MigrationName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Migration directories present on disk, oldest first.
    ///
    /// Entries whose name is not a migration name are skipped. A missing
    /// root is an empty layout.
    pub fn entries(&self) -> EngineResult<Vec<MigrationName>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(EngineError::filesystem(&self.root))? {
            let entry = entry.map_err(EngineError::filesystem(&self.root))?;
            if !entry.path().is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(raw) = file_name.to_str() else {
                continue;
            };
            match MigrationName::parse(raw) {
                Ok(name) => names.push(name),
                Err(_) => log::debug!("Skipping {} (not a migration)", entry.path().display()),
            }
        }
        names.sort();
        Ok(names)
    }

    /// An on-disk migration already using `label`, if any.
    pub fn find_label_conflict(&self, label: &str) -> EngineResult<Option<MigrationName>> {
        Ok(self.entries()?.into_iter().find(|name| name.label() == label))
    }

    /// Resolve a full migration name or a bare label to an on-disk migration.
    pub fn resolve(&self, name_or_label: &str) -> EngineResult<Option<MigrationName>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|name| name.as_str() == name_or_label || name.label() == name_or_label))
    }

    /// Create `<root>/<name>/` with empty SQL files and the entry module.
    ///
    /// Files that already exist are left untouched.
    pub fn create(&self, name: &MigrationName, entry_source: &str) -> EngineResult<PathBuf> {
        let dir = self.dir_for(name);
        std::fs::create_dir_all(&dir).map_err(EngineError::filesystem(&dir))?;

        for (file, contents) in [
            (UP_SQL, ""),
            (DOWN_SQL, ""),
            (ENTRY_FILE, entry_source),
        ] {
            let path = dir.join(file);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut handle) => handle
                    .write_all(contents.as_bytes())
                    .map_err(EngineError::filesystem(&path))?,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    log::debug!("Keeping existing {}", path.display());
                }
                Err(e) => return Err(EngineError::filesystem(&path)(e)),
            }
        }

        log::debug!("Created {}", dir.display());
        Ok(dir)
    }

    /// Best-effort removal after a failed registration.
    pub fn discard(&self, name: &MigrationName) {
        let dir = self.dir_for(name);
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Could not remove {}: {e}", dir.display());
            }
        }
    }

    /// Delete a migration's directory.
    pub fn delete(&self, name: &MigrationName) -> EngineResult<()> {
        let dir = self.dir_for(name);
        std::fs::remove_dir_all(&dir).map_err(EngineError::filesystem(&dir))?;
        log::debug!("Deleted {}", dir.display());
        Ok(())
    }

    /// Read the SQL body of `name` for `direction`.
    pub fn read_sql(&self, name: &MigrationName, direction: Direction) -> EngineResult<String> {
        let path = self.dir_for(name).join(direction.sql_file());
        std::fs::read_to_string(&path).map_err(EngineError::filesystem(&path))
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
