//! Analyzer scenario tests exercised through the public API.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::json;

use vigil::analyzer::{analyze, Health};
use vigil::models::chain::{ChainStep, StepStatus};
use vigil::models::event::{EventKind, LogEvent};
use vigil::models::issue::IssueKind;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
}

fn event_at(secs: i64, command: &str, kind: EventKind) -> LogEvent {
    LogEvent::new(base() + ChronoDuration::seconds(secs), command, kind)
}

#[test]
fn empty_history_is_healthy() {
    let result = analyze(&[], base());
    assert_eq!(result.health, Health::Healthy);
    assert!(result.issues.is_empty());
    for step in ChainStep::ALL {
        assert_eq!(result.chain.get(step), StepStatus::Pending);
    }
}

#[test]
fn green_without_red_violates_tdd_order() {
    let mut green = event_at(10, "build", EventKind::PhaseStart);
    green.phase = Some("GREEN".to_string());
    let events = vec![event_at(0, "build", EventKind::Start), green];

    let result = analyze(&events, base() + ChronoDuration::seconds(20));
    let violation = result
        .issues
        .iter()
        .find(|i| matches!(i.kind, IssueKind::TddViolation | IssueKind::OutOfOrder))
        .expect("expected a TDD ordering issue");
    assert!(violation.confidence > 0.9);
    assert_eq!(result.health, Health::Critical);
}

#[test]
fn ten_minute_gap_on_active_command_is_not_healthy() {
    let events = vec![event_at(0, "build", EventKind::Start)];
    let result = analyze(&events, base() + ChronoDuration::minutes(10));

    assert_ne!(result.health, Health::Healthy);
    assert!(result
        .issues
        .iter()
        .any(|i| matches!(i.kind, IssueKind::Silence | IssueKind::AbruptStop)));
}

#[test]
fn full_lifecycle_is_healthy_and_complete() {
    let mut milestone = event_at(60, "ideate", EventKind::Milestone);
    milestone
        .payload
        .insert("milestone".into(), json!("explored"));
    let mut complete = event_at(120, "ideate", EventKind::Complete);
    complete
        .payload
        .insert("outputs".into(), json!(["DESIGN.md"]));

    let events = vec![event_at(0, "ideate", EventKind::Start), milestone, complete];
    let result = analyze(&events, base() + ChronoDuration::seconds(130));

    assert_eq!(result.health, Health::Healthy, "issues: {:?}", result.issues);
    assert_eq!(result.chain.get(ChainStep::Ideate), StepStatus::Complete);
    assert!(result.issues.is_empty());
}

#[test]
fn chain_never_regresses_within_one_analysis() {
    let mut complete = event_at(60, "ideate", EventKind::Complete);
    complete
        .payload
        .insert("outputs".into(), json!(["DESIGN.md"]));
    complete.payload.insert("milestones".into(), json!(["m"]));

    let events = vec![
        event_at(0, "ideate", EventKind::Start),
        complete,
        // A rogue restart of the completed step.
        event_at(120, "ideate", EventKind::Start),
    ];
    let result = analyze(&events, base() + ChronoDuration::seconds(125));

    assert_eq!(result.chain.get(ChainStep::Ideate), StepStatus::Complete);
    assert!(result
        .issues
        .iter()
        .any(|i| i.kind == IssueKind::Regression));
}

#[test]
fn conflicting_signals_all_reported() {
    // A failed build that also broke TDD ordering: both issues survive.
    let mut green = event_at(10, "build", EventKind::PhaseStart);
    green.phase = Some("GREEN".to_string());
    let events = vec![
        event_at(0, "build", EventKind::Start),
        green,
        event_at(20, "build", EventKind::Failed),
    ];
    let result = analyze(&events, base() + ChronoDuration::seconds(30));

    let kinds: Vec<_> = result.issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueKind::TddViolation));
    assert!(kinds.contains(&IssueKind::ExplicitFailure));
}
