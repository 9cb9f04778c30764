//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tm_core::Config;
use tm_db::{ConnectionConfig, Session, Target};
use tm_engine::{Migrator, MigratorOptions};

use crate::cli::GlobalArgs;

/// Directory `--gen-only` writes the runner to when `runner.work_dir` is unset.
pub(crate) const DEFAULT_RUNNER_DIR: &str = "target/tidemark-runner";

/// Project directory and its configuration.
#[derive(Debug)]
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
}

/// Load the project configuration from `--config` or the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => Config::load_from_dir(&root)
            .with_context(|| format!("Failed to load config from {}", root.display()))?,
    };
    Ok(Project { root, config })
}

/// Connection settings from `--db` / `TIDEMARK_DATABASE`, else the config.
///
/// A relative database file named in the config is resolved against the
/// project directory.
pub(crate) fn connection_config(global: &GlobalArgs, project: &Project) -> Result<ConnectionConfig> {
    if let Some(raw) = &global.db {
        return ConnectionConfig::parse(raw).context("Invalid --db connection string");
    }

    let raw = project.config.database.as_deref().context(
        "No database configured: pass --db, set TIDEMARK_DATABASE, or set `database` in tidemark.yml",
    )?;
    let mut config =
        ConnectionConfig::parse(raw).context("Invalid `database` in tidemark.yml")?;
    if let Target::File(path) = &config.target {
        if path.is_relative() {
            config.target = Target::File(project.root.join(path));
        }
    }
    Ok(config)
}

/// Load the project, connect, and build a migrator.
///
/// `adjust` lets a command override options taken from the config.
pub(crate) fn open_migrator(
    global: &GlobalArgs,
    adjust: impl FnOnce(&mut MigratorOptions),
) -> Result<(Project, Migrator)> {
    let project = load_project(global)?;
    let connection = connection_config(global, &project)?;
    log::debug!("Using database {connection}");

    let mut options = MigratorOptions::from_config(&project.config, &project.root);
    adjust(&mut options);

    let session = Session::open(connection).context("Failed to connect to the database")?;
    let migrator = Migrator::new(session, options)?;
    Ok((project, migrator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(db: Option<&str>) -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            project_dir: "/srv/app".to_string(),
            config: None,
            db: db.map(str::to_string),
        }
    }

    fn project(database: Option<&str>) -> Project {
        Project {
            root: PathBuf::from("/srv/app"),
            config: Config {
                database: database.map(str::to_string),
                ..Config::default()
            },
        }
    }

    #[test]
    fn test_db_flag_wins_over_config() {
        let config = connection_config(
            &global(Some("duckdb://:memory:")),
            &project(Some("duckdb://dev.duckdb")),
        )
        .unwrap();
        assert_eq!(config.target, Target::Memory);
    }

    #[test]
    fn test_config_database_resolved_against_project() {
        let config = connection_config(&global(None), &project(Some("duckdb://dev.duckdb"))).unwrap();
        assert_eq!(config.target, Target::File(PathBuf::from("/srv/app/dev.duckdb")));
    }

    #[test]
    fn test_missing_database_is_error() {
        let err = connection_config(&global(None), &project(None)).unwrap_err();
        assert!(err.to_string().contains("No database configured"));
    }

    #[test]
    fn test_load_project_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = global(None);
        args.project_dir = dir.path().display().to_string();
        let project = load_project(&args).unwrap();
        assert_eq!(project.config, Config::default());
    }
}
