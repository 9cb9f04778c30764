//! Status command implementation

use anyhow::Result;
use tm_engine::Status;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::open_migrator;

/// Execute the status command
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let (_, migrator) = open_migrator(global, |_| {})?;
    let status = migrator.status(args.history)?;
    migrator.close()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn print_status(status: &Status) {
    match status.current_version {
        Some(version) => println!("Current version: {version}"),
        None => println!("Migrations are not initialized (run `tm init`)"),
    }

    if !status.migrations.is_empty() {
        println!();
        println!("{:>7}  {:<8}  NAME", "VERSION", "STATE");
        for entry in &status.migrations {
            let state = if entry.applied { "applied" } else { "pending" };
            let missing = if entry.on_disk { "" } else { "  (missing on disk)" };
            println!(
                "{:>7}  {:<8}  {}{missing}",
                entry.migration.version, state, entry.migration.name
            );
        }
    }

    if !status.pending.is_empty() {
        println!();
        println!("Not registered:");
        for name in &status.pending {
            println!("  {name}");
        }
    }

    if !status.history.is_empty() {
        println!();
        println!("Recent history:");
        for entry in &status.history {
            println!(
                "  {}  {:<4}  {} ({} -> {})",
                entry.applied_at.format("%Y-%m-%d %H:%M:%S"),
                entry.direction.as_str(),
                entry.migration,
                entry.from_version,
                entry.to_version
            );
        }
    }
}
