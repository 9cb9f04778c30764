//! Migration orchestration.
//!
//! [`Migrator`] owns the session and keeps three things in step: the
//! versioning schema, the migrations directory and the database schema
//! itself. Batches run in-process through the [`Applier`] unless the
//! runner execution mode is selected, in which case a generated runner
//! program is built and run through a [`BuildOracle`].

use crate::applier::Applier;
use crate::assembler::{Assembler, RunnerPlan, CONNECTION_ENV};
use crate::error::{EngineError, EngineResult};
use crate::layout::MigrationLayout;
use crate::oracle::{BuildOracle, CargoOracle, RunnerInvocation};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tm_core::{
    validate_label, Config, Direction, ExecutionMode, HistoryEntry, Migration, MigrationName,
    RunnerConfig,
};
use tm_db::{Session, Target};
use tm_version::{VersionClient, VersionError};

/// Settings a [`Migrator`] runs with.
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    /// Root of the on-disk migration layout; empty means the current directory
    pub migrations_dir: PathBuf,

    pub execution: ExecutionMode,

    pub runner: RunnerConfig,

    /// Where the runner package is built; a temp dir when `None`
    pub runner_work_dir: Option<PathBuf>,
}

impl MigratorOptions {
    /// Defaults with migrations under `migrations_dir`.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            execution: ExecutionMode::default(),
            runner: RunnerConfig::default(),
            runner_work_dir: None,
        }
    }

    /// Options from a project config, with paths resolved against `root`.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self {
            migrations_dir: config.migrations_dir_absolute(root),
            execution: config.execution,
            runner: config.runner.clone(),
            runner_work_dir: config.runner_work_dir_absolute(root),
        }
    }
}

/// Result of [`Migrator::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The versioning schema was created; `registered` holds migrations
    /// that were added before initialization.
    Initialized { registered: Vec<Migration> },
    AlreadyInitialized,
}

/// Result of [`Migrator::clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    Cleaned,
    AlreadyClean,
}

/// A migration created by [`Migrator::add`].
#[derive(Debug, Clone)]
pub struct AddedMigration {
    pub name: MigrationName,
    pub dir: PathBuf,

    /// Registration record; `None` while the database is uninitialized
    pub record: Option<Migration>,
}

impl AddedMigration {
    /// Created on disk but not registered yet.
    pub fn is_pending(&self) -> bool {
        self.record.is_none()
    }
}

/// A runner package written by [`Migrator::generate_runner`].
#[derive(Debug, Clone)]
pub struct GeneratedRunner {
    pub dir: PathBuf,
    pub current: i64,
    pub target: i64,
    pub names: Vec<MigrationName>,
}

/// One registered migration in a [`Status`] report.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub migration: Migration,
    pub applied: bool,
    pub on_disk: bool,
}

/// Snapshot of the versioning state and the migrations directory.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub initialized: bool,
    pub current_version: Option<i64>,
    pub migrations: Vec<MigrationStatus>,

    /// On disk but not registered
    pub pending: Vec<MigrationName>,

    /// Most recent moves, newest first
    pub history: Vec<HistoryEntry>,
}

/// Migration orchestration engine.
pub struct Migrator {
    session: Session,
    options: MigratorOptions,
    assembler: Assembler,
    oracle: Box<dyn BuildOracle>,
}

impl Migrator {
    /// Create a migrator over an open session.
    ///
    /// The runner path uses a [`CargoOracle`] built from `options.runner`.
    pub fn new(session: Session, options: MigratorOptions) -> EngineResult<Self> {
        let oracle = CargoOracle::new(
            options.runner.cargo.clone(),
            options.runner.package.clone(),
            options.runner_work_dir.clone(),
        );
        Ok(Self {
            session,
            assembler: Assembler::new()?,
            oracle: Box::new(oracle),
            options,
        })
    }

    /// Open a session from `connection_string` and create a migrator over it.
    pub fn connect(connection_string: &str, options: MigratorOptions) -> EngineResult<Self> {
        let session = Session::connect(connection_string)?;
        Self::new(session, options)
    }

    /// Replace the build oracle used in runner mode.
    pub fn with_oracle(mut self, oracle: impl BuildOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn options(&self) -> &MigratorOptions {
        &self.options
    }

    /// Close the underlying session.
    pub fn close(self) -> EngineResult<()> {
        self.session.close()?;
        Ok(())
    }

    fn client(&self) -> VersionClient<'_> {
        VersionClient::new(&self.session)
    }

    fn layout(&self) -> EngineResult<MigrationLayout> {
        MigrationLayout::resolve_root(&self.options.migrations_dir)
    }

    // ── Schema lifecycle ───────────────────────────────────────────────

    /// Create the versioning schema unless it already exists.
    ///
    /// Migrations added while the database was uninitialized are registered
    /// in name order in the same transaction.
    pub fn init(&self) -> EngineResult<InitOutcome> {
        if self.client().schema_exists()? {
            log::debug!("State: SchemaChecked -> AlreadyInitialized");
            log::info!("Migrations already initialized");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let pending = self.layout()?.entries()?;
        let registered = self
            .session
            .transaction(|s| -> EngineResult<Vec<Migration>> {
                let client = VersionClient::new(s);
                client.initialize()?;
                pending
                    .iter()
                    .map(|name| {
                        client
                            .register_migration(name)
                            .map_err(|e| EngineError::versioning(Some(name.as_str()), None, e))
                    })
                    .collect()
            })?;

        log::debug!("State: SchemaChecked -> Initialized");
        for migration in &registered {
            log::info!(
                "Registered pending migration {} as version {}",
                migration.name,
                migration.version
            );
        }
        log::info!("Migrations initialized");
        Ok(InitOutcome::Initialized { registered })
    }

    /// Drop the versioning schema if it exists.
    pub fn clean(&self) -> EngineResult<CleanOutcome> {
        if !self.client().schema_exists()? {
            log::info!("Migrations already clean");
            return Ok(CleanOutcome::AlreadyClean);
        }
        self.session
            .transaction(|s| VersionClient::new(s).teardown())?;
        log::info!("Migrations cleaned");
        Ok(CleanOutcome::Cleaned)
    }

    // ── Adding and removing ────────────────────────────────────────────

    /// Create a new migration labelled `label` under `dir`.
    ///
    /// With an initialized database the registration and the files are
    /// created together: a failure on either side leaves neither behind.
    pub fn add(&self, label: &str, dir: &Path) -> EngineResult<AddedMigration> {
        if label.is_empty() {
            return Err(EngineError::Validation(
                "migration name cannot be empty".to_string(),
            ));
        }
        validate_label(label)?;

        let layout = MigrationLayout::resolve_root(dir)?;
        if let Some(existing) = layout.find_label_conflict(label)? {
            return Err(EngineError::Duplicate {
                label: label.to_string(),
                existing: existing.to_string(),
            });
        }

        let client = self.client();
        let initialized = client.schema_exists()?;
        if initialized {
            if let Some(existing) = client
                .migrations()?
                .into_iter()
                .find(|m| m.name.label() == label)
            {
                return Err(EngineError::Duplicate {
                    label: label.to_string(),
                    existing: existing.name.to_string(),
                });
            }
        }

        let name = MigrationName::construct(label)?;
        let entry = self.assembler.entry_module(&name)?;

        if !initialized {
            let dir = layout.create(&name, &entry)?;
            log::warn!("Migrations are not initialized: {name} stays pending until `tm init`");
            return Ok(AddedMigration {
                name,
                dir,
                record: None,
            });
        }

        self.create_registered(&layout, name, &entry)
    }

    /// Register `name` and create its directory in one transaction.
    ///
    /// A failed create rolls the registration back and removes whatever
    /// part of the directory was written.
    fn create_registered(
        &self,
        layout: &MigrationLayout,
        name: MigrationName,
        entry: &str,
    ) -> EngineResult<AddedMigration> {
        let created = self
            .session
            .transaction(|s| -> EngineResult<(Migration, PathBuf)> {
                let record = VersionClient::new(s)
                    .register_migration(&name)
                    .map_err(|e| EngineError::versioning(Some(name.as_str()), None, e))?;
                let dir = layout.create(&name, entry)?;
                Ok((record, dir))
            });

        match created {
            Ok((record, dir)) => {
                log::info!("Created migration {name} (version {})", record.version);
                Ok(AddedMigration {
                    name,
                    dir,
                    record: Some(record),
                })
            }
            Err(e) => {
                layout.discard(&name);
                Err(e)
            }
        }
    }

    /// Remove a migration by full name or label: its registration, then
    /// its directory under `dir`.
    pub fn remove(&self, name: &str, dir: &Path) -> EngineResult<MigrationName> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "migration name cannot be empty".to_string(),
            ));
        }

        let layout = MigrationLayout::resolve_root(dir)?;
        let on_disk = layout.resolve(name)?;

        let client = self.client();
        let registered = if client.schema_exists()? {
            client
                .migrations()?
                .into_iter()
                .map(|m| m.name)
                .find(|n| n.as_str() == name || n.label() == name)
        } else {
            log::debug!("Migrations are not initialized, only deleting files");
            None
        };

        let Some(resolved) = registered.clone().or(on_disk) else {
            return Err(EngineError::versioning(
                Some(name),
                None,
                VersionError::NotFound {
                    name: name.to_string(),
                },
            ));
        };

        if registered.is_some() {
            self.session
                .transaction(|s| VersionClient::new(s).deregister_migration(&resolved))
                .map_err(|e| EngineError::versioning(Some(resolved.as_str()), None, e))?;
        }

        if layout.dir_for(&resolved).exists() {
            layout.delete(&resolved)?;
        } else {
            log::warn!("{resolved} has no directory under {}", layout.root().display());
        }

        log::info!("Removed migration {resolved}");
        Ok(resolved)
    }

    // ── Moving the version pointer ─────────────────────────────────────

    /// Apply migrations until the pointer reaches `target`.
    pub fn upgrade_to(&mut self, target: i64) -> EngineResult<i64> {
        self.migrate(target, Direction::Up)
    }

    /// Revert migrations until the pointer reaches `target`.
    pub fn downgrade_to(&mut self, target: i64) -> EngineResult<i64> {
        self.migrate(target, Direction::Down)
    }

    fn plan(&self, target: i64, direction: Direction) -> EngineResult<(i64, Vec<MigrationName>)> {
        if target < 0 {
            return Err(EngineError::Validation(format!(
                "target version must not be negative, got {target}"
            )));
        }

        let client = self.client();
        let current = client.current_version()?;
        log::debug!("State: SchemaChecked (current version {current})");

        let names = client
            .diff(current, target, direction)
            .map_err(|e| EngineError::versioning(None, Some(current), e))?;
        log::debug!(
            "State: DiffComputed ({} migration(s) {direction}, {current} -> {target})",
            names.len()
        );
        Ok((current, names))
    }

    fn migrate(&mut self, target: i64, direction: Direction) -> EngineResult<i64> {
        let (current, names) = self.plan(target, direction)?;
        if names.is_empty() {
            log::info!("Already at version {current}");
            return Ok(current);
        }

        let result = match self.options.execution {
            ExecutionMode::InProcess => self.run_in_process(current, &names, direction),
            ExecutionMode::Runner => self.run_with_runner(current, names, direction),
        };

        match &result {
            Ok(version) => log::debug!("State: Succeeded (version {version})"),
            Err(e) => log::debug!("State: Failed at version {:?}: {e}", e.version()),
        }
        result
    }

    fn run_in_process(
        &self,
        current: i64,
        names: &[MigrationName],
        direction: Direction,
    ) -> EngineResult<i64> {
        let layout = self.layout()?;
        let bodies = names
            .iter()
            .map(|name| layout.read_sql(name, direction).map(|sql| (name, sql)))
            .collect::<EngineResult<Vec<_>>>()?;

        let applier = Applier::new(&self.session);
        let mut version = current;
        for (name, sql) in bodies {
            version = match direction {
                Direction::Up => applier.apply(name, &sql)?,
                Direction::Down => applier.revert(name, &sql)?,
            };
            log::debug!("State: Applied ({name})");
        }
        Ok(version)
    }

    fn run_with_runner(
        &mut self,
        current: i64,
        names: Vec<MigrationName>,
        direction: Direction,
    ) -> EngineResult<i64> {
        if self.session.config().target == Target::Memory {
            return Err(EngineError::Validation(
                "runner execution needs a database file, an in-memory database cannot be \
                 shared with the runner process"
                    .to_string(),
            ));
        }

        let (manifest, source) = self.assemble(names, direction)?;
        log::debug!("State: RunnerAssembled");

        let invocation = RunnerInvocation {
            manifest: &manifest,
            source: &source,
            env: vec![(
                CONNECTION_ENV.to_string(),
                self.session.config().to_connection_string(),
            )],
        };
        let oracle = self.oracle.as_ref();
        let run = self
            .session
            .release_while(|| oracle.build_and_run(&invocation))?
            .map_err(|e| e.with_version(current))?;
        log::debug!("State: Built -> Executed");

        for line in run.output.lines() {
            log::info!("runner: {line}");
        }

        if !run.success() {
            let version = match self.client().current_version() {
                Ok(version) => version,
                Err(e) => {
                    log::warn!("Could not re-read the current version after the runner failed: {e}");
                    current
                }
            };
            return Err(EngineError::RunnerFailed {
                version,
                status: run.status(),
                output: run.output,
            });
        }

        Ok(self.client().current_version()?)
    }

    /// Render the runner package: `(Cargo.toml, src/main.rs)`.
    fn assemble(
        &self,
        names: Vec<MigrationName>,
        direction: Direction,
    ) -> EngineResult<(String, String)> {
        let layout = self.layout()?;
        let root = layout.root();
        let migrations_root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(EngineError::filesystem(root))?
                .join(root)
        };

        let plan = RunnerPlan {
            migrations_root,
            names,
            direction,
        };
        let source = self.assembler.assemble_runner(&plan)?;
        let manifest = self.assembler.runner_manifest(
            &self.options.runner.package,
            &self.options.runner.engine_dependency,
        )?;
        Ok((manifest, source))
    }

    /// Write the runner package that would move the pointer to `target`
    /// into `out_dir`, without building or running it.
    pub fn generate_runner(
        &self,
        target: i64,
        direction: Direction,
        out_dir: &Path,
    ) -> EngineResult<GeneratedRunner> {
        let (current, names) = self.plan(target, direction)?;
        let (manifest, source) = self.assemble(names.clone(), direction)?;
        CargoOracle::write_package(out_dir, &manifest, &source)?;

        log::info!(
            "Wrote runner for {} migration(s) ({current} -> {target}) to {}",
            names.len(),
            out_dir.display()
        );
        Ok(GeneratedRunner {
            dir: out_dir.to_path_buf(),
            current,
            target,
            names,
        })
    }

    // ── Reporting ──────────────────────────────────────────────────────

    /// Current versioning state with up to `history_limit` history entries.
    pub fn status(&self, history_limit: usize) -> EngineResult<Status> {
        let on_disk = self.layout()?.entries()?;
        let client = self.client();

        if !client.schema_exists()? {
            return Ok(Status {
                initialized: false,
                current_version: None,
                migrations: Vec::new(),
                pending: on_disk,
                history: Vec::new(),
            });
        }

        let current = client.current_version()?;
        let migrations: Vec<MigrationStatus> = client
            .migrations()?
            .into_iter()
            .map(|m| MigrationStatus {
                applied: m.is_applied(current),
                on_disk: on_disk.contains(&m.name),
                migration: m,
            })
            .collect();
        let pending = on_disk
            .into_iter()
            .filter(|name| !migrations.iter().any(|s| &s.migration.name == name))
            .collect();

        Ok(Status {
            initialized: true,
            current_version: Some(current),
            migrations,
            pending,
            history: client.history(history_limit)?,
        })
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
