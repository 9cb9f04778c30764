//! Code generation for migration entry modules and the runner program.
//!
//! The runner is a small Cargo package whose `main.rs` pulls in each
//! migration's `migrate.rs` by path and calls its entry point in batch
//! order. The connection string is handed over through [`CONNECTION_ENV`]
//! and is never written into generated source.

use crate::error::EngineResult;
use crate::layout::ENTRY_FILE;
use minijinja::{context, Environment};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tm_core::{Direction, MigrationName};

/// Environment variable the runner reads its connection string from.
pub const CONNECTION_ENV: &str = "TIDEMARK_DATABASE";

const ENTRY_TEMPLATE: &str = "migrate.rs.j2";
const MAIN_TEMPLATE: &str = "runner_main.rs.j2";
const MANIFEST_TEMPLATE: &str = "runner_Cargo.toml.j2";

/// Batch a runner program executes.
#[derive(Debug, Clone)]
pub struct RunnerPlan {
    /// Directory holding the migration directories
    pub migrations_root: PathBuf,

    /// Migrations in execution order
    pub names: Vec<MigrationName>,

    pub direction: Direction,
}

#[derive(Serialize)]
struct RunnerModule {
    ident: String,
    path: String,
}

/// Renders generated Rust sources.
pub struct Assembler {
    env: Environment<'static>,
}

impl Assembler {
    pub fn new() -> EngineResult<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template(ENTRY_TEMPLATE, include_str!("templates/migrate.rs.j2"))?;
        env.add_template(MAIN_TEMPLATE, include_str!("templates/runner_main.rs.j2"))?;
        env.add_template(
            MANIFEST_TEMPLATE,
            include_str!("templates/runner_Cargo.toml.j2"),
        )?;
        Ok(Self { env })
    }

    /// Source of the `migrate.rs` entry module for `name`.
    pub fn entry_module(&self, name: &MigrationName) -> EngineResult<String> {
        let template = self.env.get_template(ENTRY_TEMPLATE)?;
        Ok(template.render(context! { name => name.as_str() })?)
    }

    /// Source of the runner's `main.rs` for `plan`.
    pub fn assemble_runner(&self, plan: &RunnerPlan) -> EngineResult<String> {
        let migrations: Vec<RunnerModule> = plan
            .names
            .iter()
            .map(|name| RunnerModule {
                ident: name.module_ident(),
                path: path_literal(&plan.migrations_root.join(name.as_str()).join(ENTRY_FILE)),
            })
            .collect();

        let template = self.env.get_template(MAIN_TEMPLATE)?;
        Ok(template.render(context! {
            migrations => migrations,
            direction => plan.direction.as_str(),
            verb => plan.direction.verb(),
        })?)
    }

    /// `Cargo.toml` of the runner package.
    pub fn runner_manifest(&self, package: &str, engine_dependency: &str) -> EngineResult<String> {
        let template = self.env.get_template(MANIFEST_TEMPLATE)?;
        Ok(template.render(context! {
            package => package,
            engine_dependency => engine_dependency,
        })?)
    }
}

/// Rust string literal for `path`, quotes included.
fn path_literal(path: &Path) -> String {
    format!("{:?}", path.to_string_lossy())
}

#[cfg(test)]
#[path = "assembler_test.rs"]
mod tests;
