//! Pattern analyzer: a pure fold over the full event history.
//!
//! `analyze` is deterministic given the same events and reference clock,
//! carries no state between calls, and performs no IO. The supervisor
//! re-runs it over the entire history on every new event, trading
//! recomputation cost for freedom from incremental-state drift.

mod completion;
mod ordering;
mod repetition;
mod timing;

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::chain::ChainProgress;
use crate::models::event::{EventKind, LogEvent};
use crate::models::issue::Issue;
use crate::models::state::WorkflowState;

/// Tunable detection thresholds.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Gap after which an active command counts as inactive.
    pub inactivity_threshold: Duration,
    /// A (command, phase, milestone) triple may repeat this many times
    /// before it reads as a loop.
    pub loop_repeat_limit: usize,
    /// How many trailing events the loop detector inspects.
    pub loop_lookback: usize,
    /// Recent-gap multiple of the session average that flags slowdown.
    pub velocity_multiplier: f64,
    /// Minimum inter-event gap samples before gap statistics apply.
    pub min_gap_samples: usize,
    /// Live-gap multiple of the session average that marks a delegated
    /// agent as abandoned rather than merely quiet.
    pub abandoned_multiplier: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold: Duration::from_secs(300),
            loop_repeat_limit: 3,
            loop_lookback: 30,
            velocity_multiplier: 3.0,
            min_gap_samples: 6,
            abandoned_multiplier: 10.0,
        }
    }
}

/// Overall workflow health, derived from the issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Degraded,
    Critical,
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Health::Healthy => write!(f, "healthy"),
            Health::Degraded => write!(f, "degraded"),
            Health::Critical => write!(f, "critical"),
        }
    }
}

/// Output of one analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub current_command: Option<String>,
    pub current_phase: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub chain: ChainProgress,
    pub milestones: Vec<DateTime<Utc>>,
    pub issues: Vec<Issue>,
    pub health: Health,
}

impl AnalysisResult {
    /// Project into the persistable snapshot.
    pub fn project(&self) -> WorkflowState {
        WorkflowState {
            chain: self.chain.clone(),
            milestones: self.milestones.clone(),
            current_command: self.current_command.clone(),
            current_phase: self.current_phase.clone(),
            last_activity: self.last_activity,
        }
    }
}

/// Analyze the full event history with default thresholds.
pub fn analyze(events: &[LogEvent], now: DateTime<Utc>) -> AnalysisResult {
    analyze_with(&AnalyzerConfig::default(), events, now)
}

/// Analyze the full event history.
///
/// Conflicting signals may co-occur; all matching issues are returned, not
/// just the highest-confidence one.
pub fn analyze_with(
    config: &AnalyzerConfig,
    events: &[LogEvent],
    now: DateTime<Utc>,
) -> AnalysisResult {
    let mut issues = Vec::new();

    let chain = ordering::scan_chain(events, &mut issues);
    ordering::check_phase_order(events, &mut issues);
    completion::check(events, &chain, &mut issues);
    repetition::check(config, events, &mut issues);
    timing::check(config, events, now, &mut issues);

    let (current_command, current_phase) = current_position(events);
    let last_activity = events.last().map(|e| e.timestamp);
    let milestones = events
        .iter()
        .filter(|e| e.kind == EventKind::Milestone)
        .map(|e| e.timestamp)
        .collect();

    let health = health_of(&issues);

    AnalysisResult {
        current_command,
        current_phase,
        last_activity,
        chain,
        milestones,
        issues,
        health,
    }
}

/// Critical if any issue is near-certain, degraded if any issue exists.
fn health_of(issues: &[Issue]) -> Health {
    if issues.iter().any(|i| i.confidence >= 0.9) {
        Health::Critical
    } else if issues.is_empty() {
        Health::Healthy
    } else {
        Health::Degraded
    }
}

/// Walk the history to find the command (and phase) still in flight.
fn current_position(events: &[LogEvent]) -> (Option<String>, Option<String>) {
    let mut command: Option<String> = None;
    let mut phase: Option<String> = None;

    for event in events {
        match event.kind {
            EventKind::Start => {
                command = Some(event.command.clone());
                phase = None;
            }
            EventKind::PhaseStart => {
                if command.as_deref() == Some(event.command.as_str()) {
                    phase = event.phase.clone();
                }
            }
            EventKind::PhaseComplete => {
                if command.as_deref() == Some(event.command.as_str()) {
                    phase = None;
                }
            }
            EventKind::Complete | EventKind::Failed => {
                if command.as_deref() == Some(event.command.as_str()) {
                    command = None;
                    phase = None;
                }
            }
            EventKind::Milestone => {}
        }
    }

    (command, phase)
}

/// The command currently holding an unterminated START, if any.
/// Shared by the timing detectors.
pub(crate) fn active_command(events: &[LogEvent]) -> Option<&str> {
    let mut active: Option<&str> = None;
    for event in events {
        match event.kind {
            EventKind::Start => active = Some(event.command.as_str()),
            EventKind::Complete | EventKind::Failed => {
                if active == Some(event.command.as_str()) {
                    active = None;
                }
            }
            _ => {}
        }
    }
    active
}
