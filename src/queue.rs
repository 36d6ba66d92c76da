//! Task queue sink: where remediation tasks are submitted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::models::intervention::Priority;

/// Submission input for the task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    pub priority: Priority,
    /// Origin of the task: "log-monitor" or "rule-monitor".
    pub source: String,
    /// Anomaly classification that produced the task.
    pub anomaly: String,
    pub prompt: String,
    pub suggested_agent: String,
    /// Free-form context forwarded to whoever picks the task up.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

/// A task accepted by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub input: TaskInput,
}

/// External task-queue collaborator. Scheduling and persistence are the
/// queue's own concern; this crate only submits.
pub trait TaskQueue: Send + Sync {
    fn add_task(&self, input: TaskInput) -> Result<QueuedTask>;
}

/// File-backed queue: one JSON file per task in a queue directory.
pub struct FileTaskQueue {
    dir: PathBuf,
}

impl FileTaskQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn generate_id() -> String {
        let timestamp = Utc::now().timestamp();
        let uuid_short = uuid::Uuid::new_v4()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>();
        format!("task-{timestamp}-{uuid_short}")
    }
}

impl TaskQueue for FileTaskQueue {
    fn add_task(&self, input: TaskInput) -> Result<QueuedTask> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).context("Failed to create queue directory")?;
        }

        let task = QueuedTask {
            id: Self::generate_id(),
            created_at: Utc::now(),
            input,
        };

        let path = self.dir.join(format!("{}.json", task.id));
        let content =
            serde_json::to_string_pretty(&task).context("Failed to serialize task")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write task file: {}", path.display()))?;

        Ok(task)
    }
}
