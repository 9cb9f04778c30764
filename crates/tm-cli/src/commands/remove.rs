//! Remove command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, NameArgs};
use crate::commands::common::open_migrator;

/// Execute the remove command
pub fn execute(args: &NameArgs, global: &GlobalArgs) -> Result<()> {
    let name = args.name.as_deref().context("--name is required")?;
    let (_, migrator) = open_migrator(global, |_| {})?;

    let removed = migrator.remove(name, &migrator.options().migrations_dir)?;
    println!("Removed {removed}");

    migrator.close()?;
    Ok(())
}
