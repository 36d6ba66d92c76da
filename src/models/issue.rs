use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An anomaly derived from the event history.
///
/// Issues are recomputed on every analysis pass and never stored; identity
/// for deduplication purposes is the [`Issue::signature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Supporting facts (counts, gaps, offending names) for diagnostics.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub evidence: Map<String, Value>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind,
            message: message.into(),
            confidence: confidence.clamp(0.0, 1.0),
            evidence: Map::new(),
        }
    }

    /// Attach one evidence entry, builder-style.
    pub fn with_evidence(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.evidence.insert(key.to_string(), value.into());
        self
    }

    /// Deduplication key: a logically-unique problem instance.
    pub fn signature(&self) -> String {
        format!("{}|{}", self.kind.as_str(), self.message)
    }
}

/// Closed set of anomaly classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LoopDetected,
    PhaseStuck,
    AbruptStop,
    PartialCompletion,
    ExplicitFailure,
    AgentFailed,
    Regression,
    TddViolation,
    OutOfOrder,
    ChainBroken,
    MissingMilestones,
    IncompleteOutputs,
    Silence,
    DecliningVelocity,
    AgentSilence,
    AbandonedAgent,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::LoopDetected => "loop_detected",
            IssueKind::PhaseStuck => "phase_stuck",
            IssueKind::AbruptStop => "abrupt_stop",
            IssueKind::PartialCompletion => "partial_completion",
            IssueKind::ExplicitFailure => "explicit_failure",
            IssueKind::AgentFailed => "agent_failed",
            IssueKind::Regression => "regression",
            IssueKind::TddViolation => "tdd_violation",
            IssueKind::OutOfOrder => "out_of_order",
            IssueKind::ChainBroken => "chain_broken",
            IssueKind::MissingMilestones => "missing_milestones",
            IssueKind::IncompleteOutputs => "incomplete_outputs",
            IssueKind::Silence => "silence",
            IssueKind::DecliningVelocity => "declining_velocity",
            IssueKind::AgentSilence => "agent_silence",
            IssueKind::AbandonedAgent => "abandoned_agent",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
