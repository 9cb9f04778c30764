//! Clean command implementation

use anyhow::Result;
use tm_engine::CleanOutcome;

use crate::cli::GlobalArgs;
use crate::commands::common::open_migrator;

/// Execute the clean command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let (_, migrator) = open_migrator(global, |_| {})?;

    match migrator.clean()? {
        CleanOutcome::Cleaned => println!("Dropped versioning schema"),
        CleanOutcome::AlreadyClean => println!("Nothing to clean"),
    }

    migrator.close()?;
    Ok(())
}
