//! Loop detection over a bounded trailing window.

use std::collections::HashMap;

use super::AnalyzerConfig;
use crate::models::event::{EventKind, LogEvent};
use crate::models::issue::{Issue, IssueKind};

/// Flag any (command, phase, milestone) triple repeating beyond the
/// configured bound within the lookback window.
pub fn check(config: &AnalyzerConfig, events: &[LogEvent], issues: &mut Vec<Issue>) {
    let window_start = events.len().saturating_sub(config.loop_lookback);
    let window = &events[window_start..];

    let mut counts: HashMap<(&str, Option<&str>, &str), usize> = HashMap::new();
    for event in window {
        if event.kind != EventKind::Milestone {
            continue;
        }
        let Some(name) = event.milestone_name() else {
            continue;
        };
        let key = (event.command.as_str(), event.phase.as_deref(), name);
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut repeats: Vec<_> = counts
        .into_iter()
        .filter(|(_, count)| *count > config.loop_repeat_limit)
        .collect();
    repeats.sort_unstable_by_key(|((command, phase, name), _)| {
        (*command, phase.unwrap_or(""), *name)
    });

    for ((command, phase, name), count) in repeats {
        let excess = count - config.loop_repeat_limit;
        let confidence = (0.6 + 0.1 * excess as f64).min(0.95);
        let mut issue = Issue::new(
            IssueKind::LoopDetected,
            format!("milestone {name} repeating in {command}"),
            confidence,
        )
        .with_evidence("command", command)
        .with_evidence("milestone", name)
        .with_evidence("count", count);
        if let Some(phase) = phase {
            issue = issue.with_evidence("phase", phase);
        }
        issues.push(issue);
    }
}
