use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::path::PathBuf;

use crate::analyzer::{analyze_with, AnalysisResult, Health};
use crate::config::{load_settings_or_default, VigilDir};
use crate::log::{EventSource, JsonlEventSource};
use crate::models::chain::{ChainStep, StepStatus};
use crate::models::intervention::ResponseKind;

/// One-shot analysis of the full event log.
pub fn execute(log_override: Option<PathBuf>) -> Result<()> {
    let dir = VigilDir::new(".");
    let settings = load_settings_or_default(&dir)?;
    let log_path = log_override.unwrap_or_else(|| settings.log_path(&dir));

    let source = JsonlEventSource::new(&log_path);
    let events = source.read_all()?;
    let result = analyze_with(&settings.analyzer_config(), &events, Utc::now());

    print_report(&log_path, events.len(), &result);
    Ok(())
}

fn print_report(log_path: &std::path::Path, event_count: usize, result: &AnalysisResult) {
    println!(
        "{} ({} events from {})",
        health_label(result.health),
        event_count,
        log_path.display()
    );
    println!();

    println!("Chain:");
    for step in ChainStep::ALL {
        let status = result.chain.get(step);
        let marker = match status {
            StepStatus::Complete => "✓".green(),
            StepStatus::InProgress => "→".yellow(),
            StepStatus::Pending => "·".dimmed(),
        };
        println!("  {marker} {:<8} {status}", step.as_str());
    }

    if let Some(command) = &result.current_command {
        let phase = result
            .current_phase
            .as_deref()
            .map(|p| format!(" ({p})"))
            .unwrap_or_default();
        println!("\nActive: {}{phase}", command.bold());
    }
    if let Some(last) = result.last_activity {
        println!("Last activity: {last}");
    }
    println!("Milestones: {}", result.milestones.len());

    if result.issues.is_empty() {
        println!("\n{}", "No issues detected.".green());
        return;
    }

    println!("\nIssues:");
    for issue in &result.issues {
        let intervention = crate::intervention::generate(issue);
        let kind = match intervention.response {
            ResponseKind::Escalate => issue.kind.to_string().red().bold(),
            ResponseKind::AutoRemediate => issue.kind.to_string().yellow(),
            ResponseKind::NotifyOnly => issue.kind.to_string().normal(),
        };
        println!(
            "  {} [{:.0}%] {}",
            kind,
            issue.confidence * 100.0,
            issue.message
        );
    }
}

fn health_label(health: Health) -> colored::ColoredString {
    match health {
        Health::Healthy => "HEALTHY".green().bold(),
        Health::Degraded => "DEGRADED".yellow().bold(),
        Health::Critical => "CRITICAL".red().bold(),
    }
}
