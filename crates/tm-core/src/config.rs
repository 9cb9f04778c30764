//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names searched for in the project directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["tidemark.yml", "tidemark.yaml"];

/// Project configuration from tidemark.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one sub-directory per migration
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Connection string, overridden by `--db` / `TIDEMARK_DATABASE`
    #[serde(default)]
    pub database: Option<String>,

    /// How `up` and `down` execute a migration batch
    #[serde(default)]
    pub execution: ExecutionMode,

    /// Settings for the generated runner program
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Strategy used to execute a migration batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Load SQL bodies from disk and apply them on the open session
    #[default]
    InProcess,
    /// Generate a runner program, build it and run it
    Runner,
}

/// Settings for the generated runner program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Cargo package name of the generated runner
    #[serde(default = "default_runner_package")]
    pub package: String,

    /// Dependency line the runner manifest uses to pull in `tm-engine`.
    ///
    /// Defaults to a path dependency on the sources `tm` was built from;
    /// set it when those sources move or a registry release is preferred.
    #[serde(default = "default_engine_dependency")]
    pub engine_dependency: String,

    /// Build tool executable
    #[serde(default = "default_cargo")]
    pub cargo: String,

    /// Directory the runner is generated into; a temp dir when unset
    #[serde(default)]
    pub work_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            database: None,
            execution: ExecutionMode::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            package: default_runner_package(),
            engine_dependency: default_engine_dependency(),
            cargo: default_cargo(),
            work_dir: None,
        }
    }
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_runner_package() -> String {
    "tidemark-runner".to_string()
}

fn default_engine_dependency() -> String {
    format!(
        "tm-engine = {{ path = {:?} }}",
        engine_source_dir().display().to_string()
    )
}

/// `tm-engine` sources of the workspace this binary was built from.
fn engine_source_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).with_file_name("tm-engine")
}

fn default_cargo() -> String {
    "cargo".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the project directory.
    ///
    /// A project without a config file uses the defaults.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for file_name in CONFIG_FILE_NAMES {
            let path = dir.join(file_name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        log::debug!(
            "No {} in {}, using default configuration",
            CONFIG_FILE_NAMES[0],
            dir.display()
        );
        Ok(Self::default())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigParseError {
                message: "migrations_dir must not be empty".to_string(),
            });
        }
        if self.runner.package.trim().is_empty() {
            return Err(CoreError::ConfigParseError {
                message: "runner.package must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Migrations directory resolved against the project root.
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Runner work directory resolved against the project root, if set.
    pub fn runner_work_dir_absolute(&self, root: &Path) -> Option<PathBuf> {
        self.runner.work_dir.as_ref().map(|dir| root.join(dir))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
