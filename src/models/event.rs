use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single lifecycle event appended to the workflow log.
///
/// Events are immutable once appended. Append order is authoritative for
/// analysis; the timestamp is informational (wall-clock at emission).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    /// Workflow command that emitted the event (e.g. "ideate", "build").
    pub command: String,
    pub kind: EventKind,
    /// Sub-phase of the command, when applicable (build: RED/GREEN/REFACTOR).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Free-form structured data attached by the emitter.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Start,
    PhaseStart,
    Milestone,
    PhaseComplete,
    Complete,
    Failed,
}

impl EventKind {
    /// True for events that end a command's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Complete | EventKind::Failed)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Start => write!(f, "START"),
            EventKind::PhaseStart => write!(f, "PHASE_START"),
            EventKind::Milestone => write!(f, "MILESTONE"),
            EventKind::PhaseComplete => write!(f, "PHASE_COMPLETE"),
            EventKind::Complete => write!(f, "COMPLETE"),
            EventKind::Failed => write!(f, "FAILED"),
        }
    }
}

/// Error type for a single unparseable log line.
///
/// A bad line is skipped by callers; it never aborts the batch.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("empty line")]
    Empty,
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogEvent {
    /// Create an event with an empty payload.
    pub fn new(timestamp: DateTime<Utc>, command: impl Into<String>, kind: EventKind) -> Self {
        Self {
            timestamp,
            command: command.into(),
            kind,
            phase: None,
            payload: Map::new(),
        }
    }

    /// Parse one JSONL log line.
    pub fn parse_line(line: &str) -> Result<Self, EventParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(EventParseError::Empty);
        }
        Ok(serde_json::from_str(trimmed)?)
    }

    /// Milestone name, for MILESTONE events carrying one in the payload.
    pub fn milestone_name(&self) -> Option<&str> {
        self.payload.get("milestone").and_then(Value::as_str)
    }

    /// Agent identifier, when the emitter delegated work to a sub-agent.
    pub fn agent(&self) -> Option<&str> {
        self.payload.get("agent").and_then(Value::as_str)
    }

    /// String list payload field ("outputs", "milestones").
    pub fn payload_list(&self, key: &str) -> Option<Vec<&str>> {
        self.payload
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    /// Numeric payload field ("expected_outputs").
    pub fn payload_count(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }
}
