//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Tidemark - timestamped, versioned schema migrations for DuckDB
#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Database connection string (e.g. duckdb://dev.duckdb)
    #[arg(long, global = true, env = "TIDEMARK_DATABASE", hide_env_values = true)]
    pub db: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the versioning schema
    Init,

    /// Drop the versioning schema
    Clean,

    /// Create and register a new migration
    Add(NameArgs),

    /// Deregister a migration and delete its directory
    Remove(NameArgs),

    /// Apply migrations up to a version
    Up(MoveArgs),

    /// Revert migrations down to a version
    Down(MoveArgs),

    /// Show the current version and registered migrations
    Status(StatusArgs),
}

/// Arguments for the add and remove commands
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Migration label (add) or migration name or label (remove)
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments for the up and down commands
#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Target version
    #[arg(long = "version", allow_negative_numbers = true)]
    pub version: Option<i64>,

    /// Only write the runner package, do not build or run it
    #[arg(long)]
    pub gen_only: bool,

    /// Build and run a runner program instead of applying in-process
    #[arg(long)]
    pub runner: bool,

    /// Package name for the generated runner
    #[arg(short, long)]
    pub module: Option<String>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of history entries to show
    #[arg(long, default_value_t = 10)]
    pub history: usize,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
