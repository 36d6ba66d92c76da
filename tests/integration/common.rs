//! Test doubles for the supervisor's collaborators.

use anyhow::{bail, Result};
use chrono::Utc;
use std::sync::{Arc, Mutex};

use vigil::log::{EventCallback, EventSource};
use vigil::models::event::LogEvent;
use vigil::notify::NotificationSink;
use vigil::queue::{QueuedTask, TaskInput, TaskQueue};
use vigil::rules::{RuleChecker, RuleViolation};

/// Event source driven directly by the test: `emit` pushes an event into
/// the live tail synchronously.
pub struct ScriptedEventSource {
    initial: Vec<LogEvent>,
    callback: Mutex<Option<EventCallback>>,
}

impl ScriptedEventSource {
    pub fn new(initial: Vec<LogEvent>) -> Arc<Self> {
        Arc::new(Self {
            initial,
            callback: Mutex::new(None),
        })
    }

    pub fn emit(&self, event: LogEvent) {
        let mut callback = self.callback.lock().unwrap();
        if let Some(callback) = callback.as_mut() {
            callback(event);
        }
    }
}

impl EventSource for ScriptedEventSource {
    fn read_all(&self) -> Result<Vec<LogEvent>> {
        Ok(self.initial.clone())
    }

    fn tail(&self, on_event: EventCallback) -> Result<()> {
        *self.callback.lock().unwrap() = Some(on_event);
        Ok(())
    }

    fn stop_tail(&self) {
        self.callback.lock().unwrap().take();
    }
}

/// Notification sink that records every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _, _)| title.clone())
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, title: &str, message: &str, sound: &str) -> Result<()> {
        self.sent.lock().unwrap().push((
            title.to_string(),
            message.to_string(),
            sound.to_string(),
        ));
        Ok(())
    }
}

/// Queue sink that records every submission.
#[derive(Default)]
pub struct RecordingQueue {
    pub tasks: Mutex<Vec<TaskInput>>,
}

impl RecordingQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl TaskQueue for RecordingQueue {
    fn add_task(&self, input: TaskInput) -> Result<QueuedTask> {
        self.tasks.lock().unwrap().push(input.clone());
        Ok(QueuedTask {
            id: format!("test-task-{}", self.tasks.lock().unwrap().len()),
            created_at: Utc::now(),
            input,
        })
    }
}

/// Rule checker returning a fixed violation list on every pass.
pub struct ScriptedRuleChecker {
    violations: Vec<RuleViolation>,
}

impl ScriptedRuleChecker {
    pub fn new(violations: Vec<RuleViolation>) -> Arc<Self> {
        Arc::new(Self { violations })
    }
}

impl RuleChecker for ScriptedRuleChecker {
    fn check(&self) -> Result<Vec<RuleViolation>> {
        Ok(self.violations.clone())
    }
}

/// Rule checker whose every pass fails.
pub struct FailingRuleChecker;

impl RuleChecker for FailingRuleChecker {
    fn check(&self) -> Result<Vec<RuleViolation>> {
        bail!("compliance backend unreachable")
    }
}
