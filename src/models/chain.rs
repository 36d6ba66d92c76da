use serde::{Deserialize, Serialize};

/// The fixed ordered sequence of workflow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChainStep {
    Ideate,
    Plan,
    Build,
    Ship,
}

impl ChainStep {
    pub const ALL: [ChainStep; 4] = [
        ChainStep::Ideate,
        ChainStep::Plan,
        ChainStep::Build,
        ChainStep::Ship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainStep::Ideate => "ideate",
            ChainStep::Plan => "plan",
            ChainStep::Build => "build",
            ChainStep::Ship => "ship",
        }
    }

    /// Map a command name onto its chain step, if it is one.
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "ideate" => Some(ChainStep::Ideate),
            "plan" => Some(ChainStep::Plan),
            "build" => Some(ChainStep::Build),
            "ship" => Some(ChainStep::Ship),
            _ => None,
        }
    }

    /// Position in the chain, 0-based.
    pub fn position(&self) -> usize {
        match self {
            ChainStep::Ideate => 0,
            ChainStep::Plan => 1,
            ChainStep::Build => 2,
            ChainStep::Ship => 3,
        }
    }

    /// Steps that must be complete before this one finishes cleanly.
    pub fn predecessors(&self) -> &'static [ChainStep] {
        let pos = self.position();
        &Self::ALL[..pos]
    }
}

impl std::fmt::Display for ChainStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
}

impl StepStatus {
    /// Rank used to enforce forward-only movement.
    fn rank(&self) -> u8 {
        match self {
            StepStatus::Pending => 0,
            StepStatus::InProgress => 1,
            StepStatus::Complete => 2,
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::InProgress => write!(f, "in_progress"),
            StepStatus::Complete => write!(f, "complete"),
        }
    }
}

/// Per-step progress through the chain.
///
/// Statuses only move forward: a step that reached `Complete` stays
/// `Complete` no matter what later events claim. A repeated START against a
/// completed step is surfaced by the analyzer as a `regression` issue
/// instead of mutating the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProgress {
    #[serde(default)]
    pub ideate: StepStatus,
    #[serde(default)]
    pub plan: StepStatus,
    #[serde(default)]
    pub build: StepStatus,
    #[serde(default)]
    pub ship: StepStatus,
}

impl ChainProgress {
    pub fn get(&self, step: ChainStep) -> StepStatus {
        match step {
            ChainStep::Ideate => self.ideate,
            ChainStep::Plan => self.plan,
            ChainStep::Build => self.build,
            ChainStep::Ship => self.ship,
        }
    }

    fn slot(&mut self, step: ChainStep) -> &mut StepStatus {
        match step {
            ChainStep::Ideate => &mut self.ideate,
            ChainStep::Plan => &mut self.plan,
            ChainStep::Build => &mut self.build,
            ChainStep::Ship => &mut self.ship,
        }
    }

    /// Record a START for a step. No-op if the step already advanced past
    /// `InProgress`; returns true when the status actually changed.
    pub fn record_start(&mut self, step: ChainStep) -> bool {
        self.advance(step, StepStatus::InProgress)
    }

    /// Record a COMPLETE for a step.
    pub fn record_complete(&mut self, step: ChainStep) -> bool {
        self.advance(step, StepStatus::Complete)
    }

    fn advance(&mut self, step: ChainStep, to: StepStatus) -> bool {
        let slot = self.slot(step);
        if to.rank() > slot.rank() {
            *slot = to;
            true
        } else {
            false
        }
    }

    /// All steps strictly before `step` are complete.
    pub fn predecessors_complete(&self, step: ChainStep) -> bool {
        step.predecessors()
            .iter()
            .all(|s| self.get(*s) == StepStatus::Complete)
    }
}
