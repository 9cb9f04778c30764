//! Up and down command implementation

use anyhow::{Context, Result};
use tm_core::{Direction, ExecutionMode};

use crate::cli::{GlobalArgs, MoveArgs};
use crate::commands::common::{open_migrator, DEFAULT_RUNNER_DIR};

/// Execute the up or down command
pub fn execute(args: &MoveArgs, global: &GlobalArgs, direction: Direction) -> Result<()> {
    let target = args.version.context("--version is required")?;

    let (project, mut migrator) = open_migrator(global, |options| {
        if args.runner {
            options.execution = ExecutionMode::Runner;
        }
        if let Some(module) = &args.module {
            options.runner.package = module.clone();
        }
    })?;

    if args.gen_only {
        let out_dir = migrator
            .options()
            .runner_work_dir
            .clone()
            .unwrap_or_else(|| project.root.join(DEFAULT_RUNNER_DIR));
        let generated = migrator.generate_runner(target, direction, &out_dir)?;
        println!(
            "Wrote runner for {} migration(s), version {} -> {}",
            generated.names.len(),
            generated.current,
            generated.target
        );
        for name in &generated.names {
            println!("  {name}");
        }
        println!("  {}", generated.dir.display());
    } else {
        let version = match direction {
            Direction::Up => migrator.upgrade_to(target)?,
            Direction::Down => migrator.downgrade_to(target)?,
        };
        println!("At version {version}");
    }

    migrator.close()?;
    Ok(())
}
