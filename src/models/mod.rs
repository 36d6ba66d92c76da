pub mod chain;
pub mod event;
pub mod intervention;
pub mod issue;
pub mod state;

pub use chain::{ChainProgress, ChainStep, StepStatus};
pub use event::{EventKind, LogEvent};
pub use intervention::{Intervention, Notification, Priority, QueueTask, ResponseKind};
pub use issue::{Issue, IssueKind};
pub use state::WorkflowState;
