//! Completion detectors: lifecycle outcomes and COMPLETE-payload checks.
//!
//! Completed commands are expected to report what they produced: an
//! `outputs` list, optionally an `expected_outputs` count, and either
//! logged MILESTONE events or a `milestones` list in the payload.

use std::collections::HashMap;

use crate::models::chain::ChainProgress;
use crate::models::event::{EventKind, LogEvent};
use crate::models::issue::{Issue, IssueKind};

pub fn check(events: &[LogEvent], _chain: &ChainProgress, issues: &mut Vec<Issue>) {
    check_failures(events, issues);
    check_completed_commands(events, issues);
}

/// FAILED events are direct evidence, not inference.
fn check_failures(events: &[LogEvent], issues: &mut Vec<Issue>) {
    for event in events {
        if event.kind != EventKind::Failed {
            continue;
        }

        issues.push(
            Issue::new(
                IssueKind::ExplicitFailure,
                format!("{} reported failure", event.command),
                1.0,
            )
            .with_evidence("command", event.command.clone()),
        );

        if let Some(agent) = event.agent() {
            issues.push(
                Issue::new(
                    IssueKind::AgentFailed,
                    format!("agent {agent} failed during {}", event.command),
                    0.9,
                )
                .with_evidence("agent", agent)
                .with_evidence("command", event.command.clone()),
            );
        }
    }
}

fn check_completed_commands(events: &[LogEvent], issues: &mut Vec<Issue>) {
    // Group per command, preserving order within each group.
    let mut by_command: HashMap<&str, Vec<&LogEvent>> = HashMap::new();
    for event in events {
        by_command.entry(event.command.as_str()).or_default().push(event);
    }

    let mut commands: Vec<_> = by_command.keys().copied().collect();
    commands.sort_unstable();

    for command in commands {
        let command_events = &by_command[command];
        let Some(complete) = command_events
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::Complete)
        else {
            continue;
        };

        check_stuck_phases(command, command_events, issues);
        check_complete_payload(command, complete, command_events, issues);
    }
}

/// A phase that started but never completed, although the parent command
/// finished, got silently dropped somewhere.
fn check_stuck_phases(command: &str, command_events: &[&LogEvent], issues: &mut Vec<Issue>) {
    let mut starts: HashMap<&str, i64> = HashMap::new();
    for event in command_events {
        let Some(phase) = event.phase.as_deref() else {
            continue;
        };
        match event.kind {
            EventKind::PhaseStart => *starts.entry(phase).or_insert(0) += 1,
            EventKind::PhaseComplete => *starts.entry(phase).or_insert(0) -= 1,
            _ => {}
        }
    }

    let mut stuck: Vec<_> = starts
        .into_iter()
        .filter(|(_, open)| *open > 0)
        .map(|(phase, _)| phase)
        .collect();
    stuck.sort_unstable();

    for phase in stuck {
        issues.push(
            Issue::new(
                IssueKind::PhaseStuck,
                format!("phase {phase} of {command} never completed"),
                0.7,
            )
            .with_evidence("command", command)
            .with_evidence("phase", phase),
        );
    }
}

fn check_complete_payload(
    command: &str,
    complete: &LogEvent,
    command_events: &[&LogEvent],
    issues: &mut Vec<Issue>,
) {
    let outputs = complete.payload_list("outputs").unwrap_or_default();
    if outputs.is_empty() {
        issues.push(
            Issue::new(
                IssueKind::IncompleteOutputs,
                format!("{command} completed without outputs"),
                0.75,
            )
            .with_evidence("command", command),
        );
    }

    if let Some(expected) = complete.payload_count("expected_outputs") {
        if (outputs.len() as u64) < expected {
            issues.push(
                Issue::new(
                    IssueKind::PartialCompletion,
                    format!("{command} completed with fewer outputs than expected"),
                    0.8,
                )
                .with_evidence("command", command)
                .with_evidence("actual", outputs.len())
                .with_evidence("expected", expected),
            );
        }
    }

    let logged_milestones = command_events
        .iter()
        .any(|e| e.kind == EventKind::Milestone);
    let declared_milestones = complete
        .payload_list("milestones")
        .is_some_and(|m| !m.is_empty());
    if !logged_milestones && !declared_milestones {
        issues.push(
            Issue::new(
                IssueKind::MissingMilestones,
                format!("{command} completed without recording milestones"),
                0.7,
            )
            .with_evidence("command", command),
        );
    }
}
