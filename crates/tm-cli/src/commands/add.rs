//! Add command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, NameArgs};
use crate::commands::common::open_migrator;

/// Execute the add command
pub fn execute(args: &NameArgs, global: &GlobalArgs) -> Result<()> {
    let label = args.name.as_deref().context("--name is required")?;
    let (_, migrator) = open_migrator(global, |_| {})?;

    let added = migrator.add(label, &migrator.options().migrations_dir)?;
    match &added.record {
        Some(record) => println!("Created {} (version {})", added.name, record.version),
        None => println!(
            "Created {} (pending: run `tm init` to register it)",
            added.name
        ),
    }
    println!("  {}", added.dir.display());

    migrator.close()?;
    Ok(())
}
