//! Supervisor: the single owner of all mutable monitoring state.
//!
//! Subscribes to the live event tail, re-analyzes the full history on each
//! event, persists a snapshot, and dispatches deduplicated interventions.
//! A rule-check timer runs on its own thread and funnels violations
//! through the same dispatch path under a separate signature namespace.
//!
//! Failure semantics: nothing escapes `start`, `stop`, the per-event
//! handler, or the rule-check cycle. A supervisor that crashes defeats its
//! own purpose, so collaborator failures are logged and swallowed.
//! Dispatch is at-most-once: a failed delivery stays marked as dispatched.

use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::analyzer::{self, AnalysisResult, AnalyzerConfig};
use crate::intervention;
use crate::log::EventSource;
use crate::models::event::LogEvent;
use crate::models::intervention::Intervention;
use crate::models::issue::Issue;
use crate::models::state::WorkflowState;
use crate::notify::NotificationSink;
use crate::queue::{TaskInput, TaskQueue};
use crate::rules::{RuleChecker, RuleViolation};

/// Task `source` tags distinguishing the two dispatch origins.
const SOURCE_LOG_MONITOR: &str = "log-monitor";
const SOURCE_RULE_MONITOR: &str = "rule-monitor";

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Where the workflow-state snapshot is persisted.
    pub state_path: PathBuf,
    /// Cadence of the rule-compliance cycle.
    pub rule_check_interval: Duration,
    /// Run the rule-check timer while started. One-shot embedders can
    /// disable it and call `run_rule_checks_now` themselves.
    pub continuous: bool,
    pub analyzer: AnalyzerConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(".vigil/state.json"),
            rule_check_interval: Duration::from_secs(600),
            continuous: true,
            analyzer: AnalyzerConfig::default(),
        }
    }
}

type AnalyzeCallback = Box<dyn Fn(&AnalysisResult) + Send>;
type InterventionCallback = Box<dyn Fn(&Issue, &Intervention) + Send>;
type NotifyCallback = Box<dyn Fn(&str, &str) + Send>;
type ViolationCallback = Box<dyn Fn(&RuleViolation) + Send>;

#[derive(Default)]
struct Callbacks {
    analyze: Vec<AnalyzeCallback>,
    intervention: Vec<InterventionCallback>,
    notify: Vec<NotifyCallback>,
    violation: Vec<ViolationCallback>,
}

/// Mutable monitoring state, serialized behind one lock.
struct Shared {
    history: Vec<LogEvent>,
    state: WorkflowState,
    /// Signatures already dispatched. Process-lifetime, no eviction.
    dispatched: HashSet<String>,
}

struct Inner {
    config: SupervisorConfig,
    source: Arc<dyn EventSource>,
    notifier: Arc<dyn NotificationSink>,
    queue: Arc<dyn TaskQueue>,
    rules: Option<Arc<dyn RuleChecker>>,
    running: AtomicBool,
    shutdown: AtomicBool,
    shared: Mutex<Shared>,
    callbacks: Mutex<Callbacks>,
}

pub struct Supervisor {
    inner: Arc<Inner>,
    rule_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        source: Arc<dyn EventSource>,
        notifier: Arc<dyn NotificationSink>,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                source,
                notifier,
                queue,
                rules: None,
                running: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                shared: Mutex::new(Shared {
                    history: Vec::new(),
                    state: WorkflowState::default(),
                    dispatched: HashSet::new(),
                }),
                callbacks: Mutex::new(Callbacks::default()),
            }),
            rule_thread: Mutex::new(None),
        }
    }

    /// Attach the rule-compliance checker. Must be called before `start`.
    pub fn with_rule_checker(mut self, checker: Arc<dyn RuleChecker>) -> Self {
        let inner = Arc::get_mut(&mut self.inner)
            .expect("with_rule_checker must be called before start");
        inner.rules = Some(checker);
        self
    }

    /// Start supervising. Idempotent when already running.
    ///
    /// Loads the persisted snapshot (corrupt or missing means it is
    /// rebuilt from a full replay), seeds the in-memory history, begins
    /// consuming the live tail, and starts the rule-check timer when
    /// configured for continuous monitoring.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.shutdown.store(false, Ordering::SeqCst);

        self.inner.load_initial_state();

        let tail_inner = Arc::clone(&self.inner);
        if let Err(e) = self
            .inner
            .source
            .tail(Box::new(move |event| tail_inner.handle_event(event)))
        {
            tracing::warn!("failed to subscribe to event tail: {e:#}");
        }

        if self.inner.config.continuous && self.inner.rules.is_some() {
            let timer_inner = Arc::clone(&self.inner);
            let handle = thread::spawn(move || timer_inner.run_rule_timer());
            *self.rule_thread.lock().expect("rule thread lock poisoned") = Some(handle);
        }
    }

    /// Stop supervising. Idempotent; safe to call while events are in
    /// flight. The rule timer is cancelled before this returns and the
    /// final state is persisted. Already-queued interventions stand.
    pub fn stop(&self) {
        if !self.inner.running.load(Ordering::SeqCst) {
            return;
        }
        self.inner.shutdown.store(true, Ordering::SeqCst);
        self.inner.source.stop_tail();

        let handle = self
            .rule_thread
            .lock()
            .expect("rule thread lock poisoned")
            .take();
        if let Some(handle) = handle {
            wait_with_timeout(handle, "rule-check", Duration::from_secs(5));
        }

        self.inner.persist_state();
        self.inner.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Defensive copy of the current workflow state.
    pub fn state(&self) -> WorkflowState {
        self.inner
            .shared
            .lock()
            .expect("shared state lock poisoned")
            .state
            .clone()
    }

    /// Run a rule-compliance pass immediately, outside the timer cadence.
    pub fn run_rule_checks_now(&self) {
        self.inner.run_rule_checks();
    }

    // Passthrough hints, forwarded to the checker uninterpreted.

    pub fn track_file_change(&self, path: &std::path::Path) {
        if let Some(rules) = &self.inner.rules {
            rules.track_file_change(path);
        }
    }

    pub fn track_tool_call(&self, tool: &str) {
        if let Some(rules) = &self.inner.rules {
            rules.track_tool_call(tool);
        }
    }

    pub fn set_active_feature(&self, feature: &str) {
        if let Some(rules) = &self.inner.rules {
            rules.set_active_feature(feature);
        }
    }

    // Observer registration. Callbacks fire on the processing thread.

    pub fn on_analyze(&self, callback: impl Fn(&AnalysisResult) + Send + 'static) {
        self.callbacks().analyze.push(Box::new(callback));
    }

    pub fn on_intervention(&self, callback: impl Fn(&Issue, &Intervention) + Send + 'static) {
        self.callbacks().intervention.push(Box::new(callback));
    }

    pub fn on_notify(&self, callback: impl Fn(&str, &str) + Send + 'static) {
        self.callbacks().notify.push(Box::new(callback));
    }

    pub fn on_rule_violation(&self, callback: impl Fn(&RuleViolation) + Send + 'static) {
        self.callbacks().violation.push(Box::new(callback));
    }

    fn callbacks(&self) -> std::sync::MutexGuard<'_, Callbacks> {
        self.inner.callbacks.lock().expect("callbacks lock poisoned")
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    /// Seed state and history. The snapshot is the fast path for restarts;
    /// the analyzer always needs the full history, so the log is replayed
    /// either way, and a corrupt snapshot just means the projection is
    /// recomputed from that replay.
    fn load_initial_state(&self) {
        let snapshot = match WorkflowState::load(&self.config.state_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("state load failed, rebuilding from log: {e:#}");
                None
            }
        };

        let history = match self.source.read_all() {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("event replay failed, starting empty: {e:#}");
                Vec::new()
            }
        };

        let state = match snapshot {
            Some(state) => state,
            None => analyzer::analyze_with(&self.config.analyzer, &history, Utc::now()).project(),
        };

        {
            let mut shared = self.shared.lock().expect("shared state lock poisoned");
            shared.history = history;
            shared.state = state;
        }
        self.persist_state();
    }

    /// Per-event pipeline. Never panics or propagates: a supervisor that
    /// dies on a bad event is worse than the anomaly it missed.
    fn handle_event(&self, event: LogEvent) {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }

        let (result, fresh_issues) = {
            let mut shared = self.shared.lock().expect("shared state lock poisoned");
            shared.history.push(event);
            let result =
                analyzer::analyze_with(&self.config.analyzer, &shared.history, Utc::now());
            shared.state = result.project();

            let fresh: Vec<Issue> = result
                .issues
                .iter()
                .filter(|issue| shared.dispatched.insert(issue.signature()))
                .cloned()
                .collect();
            (result, fresh)
        };

        self.persist_state();

        for issue in &fresh_issues {
            self.dispatch_issue(issue);
        }

        let callbacks = self.callbacks.lock().expect("callbacks lock poisoned");
        for callback in &callbacks.analyze {
            callback(&result);
        }
    }

    fn dispatch_issue(&self, issue: &Issue) {
        let intervention = intervention::generate(issue);

        self.deliver_notification(&intervention);

        if let Some(task) = &intervention.queue_task {
            let input = TaskInput {
                priority: task.priority,
                source: SOURCE_LOG_MONITOR.to_string(),
                anomaly: issue.kind.as_str().to_string(),
                prompt: task.prompt.clone(),
                suggested_agent: task.agent_kind.clone(),
                context: json!({ "evidence": issue.evidence }),
            };
            if let Err(e) = self.queue.add_task(input) {
                tracing::warn!("queue submission failed (not retried): {e:#}");
            }
        }

        let callbacks = self.callbacks.lock().expect("callbacks lock poisoned");
        for callback in &callbacks.intervention {
            callback(issue, &intervention);
        }
    }

    fn deliver_notification(&self, intervention: &Intervention) {
        let notification = &intervention.notification;
        if let Err(e) = self.notifier.notify(
            &notification.title,
            &notification.message,
            &notification.sound,
        ) {
            tracing::warn!("notification failed (not retried): {e:#}");
        }

        let callbacks = self.callbacks.lock().expect("callbacks lock poisoned");
        for callback in &callbacks.notify {
            callback(&notification.title, &notification.message);
        }
    }

    /// Timer loop for the rule-check cycle. Sleeps in short slices so
    /// `stop` never waits out a full interval.
    fn run_rule_timer(&self) {
        let slice = Duration::from_millis(50);
        let mut elapsed = Duration::ZERO;

        while !self.shutdown.load(Ordering::SeqCst) {
            thread::sleep(slice);
            elapsed += slice;
            if elapsed >= self.config.rule_check_interval {
                elapsed = Duration::ZERO;
                self.run_rule_checks();
            }
        }
    }

    /// One rule-compliance pass. A failing checker is logged and ignored;
    /// it must never take the supervisor down or block the next cycle.
    fn run_rule_checks(&self) {
        let Some(checker) = &self.rules else {
            return;
        };

        let violations = match checker.check() {
            Ok(violations) => violations,
            Err(e) => {
                tracing::warn!("rule check failed, skipping cycle: {e:#}");
                return;
            }
        };

        let fresh: Vec<RuleViolation> = {
            let mut shared = self.shared.lock().expect("shared state lock poisoned");
            violations
                .into_iter()
                .filter(|violation| shared.dispatched.insert(violation.signature()))
                .collect()
        };

        for violation in &fresh {
            let intervention = intervention::generate_for_violation(violation);
            self.deliver_notification(&intervention);

            if let Some(task) = &intervention.queue_task {
                let input = TaskInput {
                    priority: task.priority,
                    source: SOURCE_RULE_MONITOR.to_string(),
                    anomaly: violation.kind.clone(),
                    prompt: task.prompt.clone(),
                    suggested_agent: task.agent_kind.clone(),
                    context: json!({ "law": violation.law }),
                };
                if let Err(e) = self.queue.add_task(input) {
                    tracing::warn!("queue submission failed (not retried): {e:#}");
                }
            }

            let callbacks = self.callbacks.lock().expect("callbacks lock poisoned");
            for callback in &callbacks.violation {
                callback(violation);
            }
        }

        self.persist_state();
    }

    /// Best-effort snapshot write; persistence failures are never fatal.
    fn persist_state(&self) {
        let state = self
            .shared
            .lock()
            .expect("shared state lock poisoned")
            .state
            .clone();
        if let Err(e) = state.save(&self.config.state_path) {
            tracing::warn!("state persistence failed: {e:#}");
        }
    }
}

/// Wait for a worker thread with a timeout; an unresponsive thread is
/// abandoned rather than blocking shutdown forever.
fn wait_with_timeout(handle: JoinHandle<()>, name: &str, timeout: Duration) {
    let check_interval = Duration::from_millis(50);
    let start = std::time::Instant::now();
    while !handle.is_finished() && start.elapsed() < timeout {
        thread::sleep(check_interval);
    }
    if handle.is_finished() {
        let _ = handle.join();
    } else {
        tracing::warn!("{name} thread did not terminate within timeout");
    }
}
