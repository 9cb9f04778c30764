//! Init command implementation

use anyhow::Result;
use tm_engine::InitOutcome;

use crate::cli::GlobalArgs;
use crate::commands::common::open_migrator;

/// Execute the init command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let (_, migrator) = open_migrator(global, |_| {})?;

    match migrator.init()? {
        InitOutcome::Initialized { registered } => {
            println!("Initialized migrations");
            for migration in &registered {
                println!(
                    "  Registered {} as version {}",
                    migration.name, migration.version
                );
            }
        }
        InitOutcome::AlreadyInitialized => println!("Migrations already initialized"),
    }

    migrator.close()?;
    Ok(())
}
