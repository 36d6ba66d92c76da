use anyhow::Result;
use colored::Colorize;

use crate::config::VigilDir;

/// Initialize the `.vigil/` directory in the current working directory.
pub fn execute() -> Result<()> {
    let dir = VigilDir::new(".");
    dir.initialize()?;

    println!("{} Initialized {}", "✓".green(), dir.root().display());
    println!("  config:  {}", dir.config_path().display());
    println!("  queue:   {}", dir.queue_dir().display());
    println!();
    println!("Point [log].path at your workflow's event log, then run:");
    println!("  {}", "vigil watch".bold());

    Ok(())
}
