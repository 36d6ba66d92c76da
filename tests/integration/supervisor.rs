//! Supervisor integration tests: dispatch dedup, state rebuild, rule-check
//! isolation, and lifecycle idempotency.

use chrono::Utc;
use serde_json::json;
use serial_test::serial;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use vigil::analyzer::analyze;
use vigil::log::{EventSource, JsonlEventSource};
use vigil::models::chain::{ChainStep, StepStatus};
use vigil::models::event::{EventKind, LogEvent};
use vigil::models::intervention::Priority;
use vigil::models::state::WorkflowState;
use vigil::rules::RuleViolation;
use vigil::supervisor::{Supervisor, SupervisorConfig};

use crate::common::{
    FailingRuleChecker, RecordingNotifier, RecordingQueue, ScriptedEventSource,
    ScriptedRuleChecker,
};

fn test_config(dir: &Path) -> SupervisorConfig {
    SupervisorConfig {
        state_path: dir.join("state.json"),
        continuous: false,
        ..SupervisorConfig::default()
    }
}

fn now_event(command: &str, kind: EventKind) -> LogEvent {
    LogEvent::new(Utc::now(), command, kind)
}

#[test]
fn recurring_issue_dispatches_exactly_once() {
    let temp = TempDir::new().unwrap();
    let source = ScriptedEventSource::new(Vec::new());
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let supervisor = Supervisor::new(
        test_config(temp.path()),
        source.clone(),
        notifier.clone(),
        queue.clone(),
    );
    supervisor.start();

    source.emit(now_event("build", EventKind::Start));
    let mut green = now_event("build", EventKind::PhaseStart);
    green.phase = Some("GREEN".to_string());
    source.emit(green);

    // The violation is now part of history: every further analysis finds
    // it again, but its signature is already dispatched.
    let mut milestone = now_event("build", EventKind::Milestone);
    milestone.payload.insert("milestone".into(), json!("tests"));
    source.emit(milestone);

    assert_eq!(notifier.count(), 1, "titles: {:?}", notifier.titles());
    assert!(notifier.titles()[0].contains("TDD"));
    assert_eq!(queue.count(), 1);

    let task = &queue.tasks.lock().unwrap()[0];
    assert_eq!(task.source, "log-monitor");
    assert_eq!(task.anomaly, "tdd_violation");
    assert_eq!(task.priority, Priority::High);

    supervisor.stop();
}

#[test]
fn corrupt_snapshot_rebuilds_from_replay() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("events.jsonl");
    let state_path = temp.path().join("state.json");

    let lines = [
        r#"{"timestamp":"2026-01-10T09:00:00Z","command":"ideate","kind":"START"}"#,
        r#"{"timestamp":"2026-01-10T09:01:00Z","command":"ideate","kind":"MILESTONE","payload":{"milestone":"explored"}}"#,
        r#"{"timestamp":"2026-01-10T09:02:00Z","command":"ideate","kind":"COMPLETE","payload":{"outputs":["DESIGN.md"]}}"#,
    ];
    std::fs::write(&log_path, lines.join("\n") + "\n").unwrap();
    std::fs::write(&state_path, "{{ definitely not json").unwrap();

    let source = Arc::new(JsonlEventSource::new(&log_path));
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let config = SupervisorConfig {
        state_path: state_path.clone(),
        continuous: false,
        ..SupervisorConfig::default()
    };
    let supervisor = Supervisor::new(config, source.clone(), notifier, queue);
    supervisor.start();

    let expected = analyze(&source.read_all().unwrap(), Utc::now()).project();
    assert_eq!(supervisor.state(), expected);
    assert_eq!(
        supervisor.state().chain.get(ChainStep::Ideate),
        StepStatus::Complete
    );

    // The rebuilt snapshot was re-persisted in valid form.
    let reloaded = WorkflowState::load(&state_path).unwrap();
    assert_eq!(reloaded, Some(expected));

    supervisor.stop();
}

#[test]
fn failing_rule_checker_does_not_crash_or_dispatch() {
    let temp = TempDir::new().unwrap();
    let source = ScriptedEventSource::new(Vec::new());
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let supervisor = Supervisor::new(
        test_config(temp.path()),
        source,
        notifier.clone(),
        queue.clone(),
    )
    .with_rule_checker(Arc::new(FailingRuleChecker));
    supervisor.start();

    supervisor.run_rule_checks_now();
    supervisor.run_rule_checks_now();

    assert!(supervisor.is_running());
    assert_eq!(notifier.count(), 0);
    assert_eq!(queue.count(), 0);

    supervisor.stop();
    assert!(!supervisor.is_running());
}

#[test]
fn rule_violations_dedup_and_queue_high_priority() {
    let temp = TempDir::new().unwrap();
    let source = ScriptedEventSource::new(Vec::new());
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let checker = ScriptedRuleChecker::new(vec![RuleViolation {
        law: "no-direct-push".to_string(),
        kind: "process".to_string(),
        message: "pushed to main without review".to_string(),
        corrective_action: Some("revert and open a PR".to_string()),
    }]);

    let supervisor = Supervisor::new(
        test_config(temp.path()),
        source,
        notifier.clone(),
        queue.clone(),
    )
    .with_rule_checker(checker);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_sink = Arc::clone(&seen);
    supervisor.on_rule_violation(move |violation| {
        seen_sink.lock().unwrap().push(violation.law.clone());
    });

    supervisor.start();
    supervisor.run_rule_checks_now();
    supervisor.run_rule_checks_now();

    assert_eq!(notifier.count(), 1);
    assert!(notifier.titles()[0].contains("no-direct-push"));
    assert_eq!(queue.count(), 1);

    let task = &queue.tasks.lock().unwrap()[0];
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.source, "rule-monitor");
    assert!(task.prompt.contains("no-direct-push"));

    assert_eq!(seen.lock().unwrap().as_slice(), ["no-direct-push"]);

    supervisor.stop();
}

#[test]
#[serial]
fn live_tail_updates_state_and_observers() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("events.jsonl");
    std::fs::write(&log_path, "").unwrap();

    let source = Arc::new(JsonlEventSource::with_poll_interval(
        &log_path,
        Duration::from_millis(10),
    ));
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let supervisor = Supervisor::new(
        test_config(temp.path()),
        source,
        notifier,
        queue,
    );

    let analyses = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&analyses);
    supervisor.on_analyze(move |_| {
        *counter.lock().unwrap() += 1;
    });

    supervisor.start();

    let line = format!(
        r#"{{"timestamp":"{}","command":"ideate","kind":"START"}}"#,
        Utc::now().to_rfc3339()
    );
    let mut content = std::fs::read_to_string(&log_path).unwrap();
    content.push_str(&line);
    content.push('\n');
    std::fs::write(&log_path, content).unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while supervisor.state().current_command.is_none()
        && std::time::Instant::now() < deadline
    {
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(supervisor.state().current_command.as_deref(), Some("ideate"));
    assert_eq!(
        supervisor.state().chain.get(ChainStep::Ideate),
        StepStatus::InProgress
    );
    assert!(*analyses.lock().unwrap() >= 1);

    supervisor.stop();
}

#[test]
fn start_and_stop_are_idempotent() {
    let temp = TempDir::new().unwrap();
    let source = ScriptedEventSource::new(Vec::new());
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let supervisor = Supervisor::new(test_config(temp.path()), source, notifier, queue);

    assert!(!supervisor.is_running());
    supervisor.start();
    supervisor.start();
    assert!(supervisor.is_running());

    supervisor.stop();
    supervisor.stop();
    assert!(!supervisor.is_running());

    // Restartable after a stop.
    supervisor.start();
    assert!(supervisor.is_running());
    supervisor.stop();
}

#[test]
fn notify_observer_sees_dispatched_notifications() {
    let temp = TempDir::new().unwrap();
    let source = ScriptedEventSource::new(Vec::new());
    let notifier = RecordingNotifier::new();
    let queue = RecordingQueue::new();

    let supervisor = Supervisor::new(
        test_config(temp.path()),
        source.clone(),
        notifier,
        queue,
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_sink = Arc::clone(&seen);
    supervisor.on_notify(move |title, _message| {
        seen_sink.lock().unwrap().push(title.to_string());
    });

    supervisor.start();
    source.emit(now_event("build", EventKind::Failed));

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|title| title.contains("failure")));

    supervisor.stop();
}
