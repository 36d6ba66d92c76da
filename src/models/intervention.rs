use serde::{Deserialize, Serialize};

/// How the supervisor responds to an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Tell the human; no automated follow-up.
    NotifyOnly,
    /// Tell the human and queue a remediation task.
    AutoRemediate,
    /// Needs human attention now; urgent notification.
    Escalate,
}

/// Urgency of a queued remediation task, derived from issue confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// >= 0.9 -> High, >= 0.6 -> Medium, else Low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            Priority::High
        } else if confidence >= 0.6 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// User-facing notification content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Sound hint for the desktop notifier ("default", "warning", "critical").
    pub sound: String,
}

/// A remediation task destined for the task queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTask {
    pub priority: Priority,
    /// Instructions for the remediation agent.
    pub prompt: String,
    /// Which kind of agent should pick this up.
    pub agent_kind: String,
}

/// Transient dispatch artifact derived 1:1 from an issue or rule violation.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub response: ResponseKind,
    pub notification: Notification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_task: Option<QueueTask>,
}
