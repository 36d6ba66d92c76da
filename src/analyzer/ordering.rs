//! Ordering detectors: chain progression, regression, chain breaks, and
//! the build-phase TDD cycle.

use crate::models::chain::{ChainProgress, ChainStep, StepStatus};
use crate::models::event::{EventKind, LogEvent};
use crate::models::issue::{Issue, IssueKind};

/// Scan START/COMPLETE events into chain progress, reporting regressions
/// and broken chains along the way.
///
/// The chain itself never regresses: a START against a completed step is
/// reported as an issue and otherwise ignored.
pub fn scan_chain(events: &[LogEvent], issues: &mut Vec<Issue>) -> ChainProgress {
    let mut chain = ChainProgress::default();

    for event in events {
        let Some(step) = ChainStep::from_command(&event.command) else {
            continue;
        };

        match event.kind {
            EventKind::Start => {
                if chain.get(step) == StepStatus::Complete {
                    issues.push(
                        Issue::new(
                            IssueKind::Regression,
                            format!("{step} restarted after completion"),
                            0.85,
                        )
                        .with_evidence("step", step.as_str()),
                    );
                } else {
                    chain.record_start(step);
                }
            }
            EventKind::Complete => {
                if !chain.predecessors_complete(step) {
                    let missing = step
                        .predecessors()
                        .iter()
                        .find(|s| chain.get(**s) != StepStatus::Complete)
                        .map(|s| s.as_str())
                        .unwrap_or("earlier step");
                    issues.push(
                        Issue::new(
                            IssueKind::ChainBroken,
                            format!("{step} completed before {missing}"),
                            0.85,
                        )
                        .with_evidence("step", step.as_str())
                        .with_evidence("missing", missing),
                    );
                }
                chain.record_complete(step);
            }
            _ => {}
        }
    }

    chain
}

/// Check phase ordering: every PHASE_START needs an active command, and
/// build phases must cycle RED -> GREEN -> REFACTOR (RED opens a new cycle).
pub fn check_phase_order(events: &[LogEvent], issues: &mut Vec<Issue>) {
    let mut active: Option<&str> = None;
    // Current build cycle state. A build START or a RED phase resets it.
    let mut saw_red = false;
    let mut saw_green = false;

    for event in events {
        match event.kind {
            EventKind::Start => {
                active = Some(event.command.as_str());
                if event.command == "build" {
                    saw_red = false;
                    saw_green = false;
                }
            }
            EventKind::Complete | EventKind::Failed => {
                if active == Some(event.command.as_str()) {
                    active = None;
                }
            }
            EventKind::PhaseStart => {
                if active != Some(event.command.as_str()) {
                    issues.push(
                        Issue::new(
                            IssueKind::OutOfOrder,
                            format!("phase started for {} without an active START", event.command),
                            0.9,
                        )
                        .with_evidence("command", event.command.clone()),
                    );
                    continue;
                }

                if event.command != "build" {
                    continue;
                }

                match event.phase.as_deref() {
                    Some("RED") => {
                        saw_red = true;
                        saw_green = false;
                    }
                    Some("GREEN") => {
                        if !saw_red {
                            issues.push(
                                Issue::new(
                                    IssueKind::TddViolation,
                                    "GREEN phase started without a prior RED in the build cycle",
                                    0.95,
                                )
                                .with_evidence("phase", "GREEN"),
                            );
                        }
                        saw_green = true;
                    }
                    Some("REFACTOR") => {
                        if !saw_green {
                            issues.push(
                                Issue::new(
                                    IssueKind::OutOfOrder,
                                    "REFACTOR phase started before GREEN in the build cycle",
                                    0.92,
                                )
                                .with_evidence("phase", "REFACTOR"),
                            );
                        }
                        // REFACTOR closes the cycle; the next one starts at RED.
                        saw_red = false;
                        saw_green = false;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
