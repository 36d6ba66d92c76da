use anyhow::Result;
use colored::Colorize;

use crate::config::VigilDir;
use crate::models::chain::{ChainStep, StepStatus};
use crate::models::state::WorkflowState;

/// Show the last persisted workflow snapshot.
pub fn execute() -> Result<()> {
    let dir = VigilDir::new(".");
    let Some(state) = WorkflowState::load(&dir.state_path())? else {
        println!(
            "No supervisor state found. Run {} first.",
            "vigil watch".bold()
        );
        return Ok(());
    };

    println!("Chain:");
    for step in ChainStep::ALL {
        let status = state.chain.get(step);
        let marker = match status {
            StepStatus::Complete => "✓".green(),
            StepStatus::InProgress => "→".yellow(),
            StepStatus::Pending => "·".dimmed(),
        };
        println!("  {marker} {:<8} {status}", step.as_str());
    }

    match &state.current_command {
        Some(command) => {
            let phase = state
                .current_phase
                .as_deref()
                .map(|p| format!(" ({p})"))
                .unwrap_or_default();
            println!("\nActive: {}{phase}", command.bold());
        }
        None => println!("\nNo command in flight."),
    }

    if let Some(last) = state.last_activity {
        println!("Last activity: {last}");
    }
    println!("Milestones: {}", state.milestones.len());

    Ok(())
}
