//! Tidemark CLI - timestamped, versioned schema migrations for DuckDB

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

use cli::Cli;
use commands::{add, clean, init, migrate, remove, status};
use tm_core::Direction;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `info` by default, `debug` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Init => init::execute(&cli.global),
        cli::Commands::Clean => clean::execute(&cli.global),
        cli::Commands::Add(args) => add::execute(args, &cli.global),
        cli::Commands::Remove(args) => remove::execute(args, &cli.global),
        cli::Commands::Up(args) => migrate::execute(args, &cli.global, Direction::Up),
        cli::Commands::Down(args) => migrate::execute(args, &cli.global, Direction::Down),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
    }
}
