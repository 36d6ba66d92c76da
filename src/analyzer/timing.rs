//! Timing detectors: inactivity on an active command, and gap statistics
//! across the session (velocity decline, quiet or abandoned agents).
//!
//! Messages stay free of elapsed-time figures so a persisting condition
//! keeps one dedup signature across re-analyses; the numbers go into the
//! evidence map instead.

use chrono::{DateTime, Utc};

use super::{active_command, AnalyzerConfig};
use crate::models::event::{EventKind, LogEvent};
use crate::models::issue::{Issue, IssueKind};

pub fn check(
    config: &AnalyzerConfig,
    events: &[LogEvent],
    now: DateTime<Utc>,
    issues: &mut Vec<Issue>,
) {
    check_inactivity(config, events, now, issues);
    check_gap_statistics(config, events, now, issues);
}

/// silence / abrupt_stop: an active command that went quiet.
fn check_inactivity(
    config: &AnalyzerConfig,
    events: &[LogEvent],
    now: DateTime<Utc>,
    issues: &mut Vec<Issue>,
) {
    let Some(command) = active_command(events) else {
        return;
    };
    let Some(last) = events.last() else {
        return;
    };

    let threshold = config.inactivity_threshold.as_secs_f64();
    let gap = (now - last.timestamp).num_milliseconds() as f64 / 1000.0;
    if gap <= threshold || threshold <= 0.0 {
        return;
    }

    let produced_milestones = events
        .iter()
        .any(|e| e.kind == EventKind::Milestone && e.command == command);

    let ratio = gap / threshold;
    if !produced_milestones && ratio >= 2.0 {
        // Started and then vanished without a single checkpoint.
        let confidence = (0.7 + 0.05 * (ratio - 2.0)).min(0.95);
        issues.push(
            Issue::new(
                IssueKind::AbruptStop,
                format!("{command} went silent before its first milestone"),
                confidence,
            )
            .with_evidence("command", command)
            .with_evidence("gap_secs", gap as u64),
        );
    } else {
        let confidence = (0.6 + 0.05 * (ratio - 1.0)).min(0.85);
        issues.push(
            Issue::new(
                IssueKind::Silence,
                format!("{command} stopped making progress"),
                confidence,
            )
            .with_evidence("command", command)
            .with_evidence("gap_secs", gap as u64),
        );
    }
}

/// declining_velocity / agent_silence / abandoned_agent: the session's
/// inter-event rhythm against its own history.
fn check_gap_statistics(
    config: &AnalyzerConfig,
    events: &[LogEvent],
    now: DateTime<Utc>,
    issues: &mut Vec<Issue>,
) {
    let gaps: Vec<f64> = events
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / 1000.0)
        .filter(|gap| *gap >= 0.0)
        .collect();

    if gaps.len() >= config.min_gap_samples {
        // Recent gaps against the historical average, not the overall one:
        // including the slow tail in the baseline would mask the slowdown.
        let (history, recent) = gaps.split_at(gaps.len() - 3);
        let historical_mean = history.iter().sum::<f64>() / history.len() as f64;
        let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;

        if historical_mean > 0.0 {
            let ratio = recent_mean / historical_mean;
            if ratio > config.velocity_multiplier {
                let confidence =
                    (0.5 + 0.1 * (ratio - config.velocity_multiplier)).min(0.85);
                issues.push(
                    Issue::new(
                        IssueKind::DecliningVelocity,
                        "event cadence is slowing down",
                        confidence,
                    )
                    .with_evidence("mean_gap_secs", historical_mean as u64)
                    .with_evidence("recent_gap_secs", recent_mean as u64),
                );
            }
        }
    }

    check_agent_gaps(config, events, now, &gaps, issues);
}

/// The last event delegated to an agent and nothing has come back.
fn check_agent_gaps(
    config: &AnalyzerConfig,
    events: &[LogEvent],
    now: DateTime<Utc>,
    gaps: &[f64],
    issues: &mut Vec<Issue>,
) {
    let Some(last) = events.last() else {
        return;
    };
    let Some(agent) = last.agent() else {
        return;
    };
    if last.kind.is_terminal() || gaps.len() < 3 {
        return;
    }

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= 0.0 {
        return;
    }

    let live_gap = (now - last.timestamp).num_milliseconds() as f64 / 1000.0;
    let threshold = config.inactivity_threshold.as_secs_f64();

    if live_gap > config.abandoned_multiplier * mean && live_gap > threshold {
        issues.push(
            Issue::new(
                IssueKind::AbandonedAgent,
                format!("agent {agent} appears abandoned"),
                0.9,
            )
            .with_evidence("agent", agent)
            .with_evidence("gap_secs", live_gap as u64),
        );
    } else if live_gap > config.velocity_multiplier * mean {
        issues.push(
            Issue::new(
                IssueKind::AgentSilence,
                format!("agent {agent} has gone quiet"),
                0.75,
            )
            .with_evidence("agent", agent)
            .with_evidence("gap_secs", live_gap as u64),
        );
    }
}
