//! vigil - workflow supervision library
//!
//! Watches the append-only event log written by an automated agent
//! workflow (ideate -> plan -> build -> ship), classifies anomalies, and
//! dispatches deduplicated interventions (desktop notifications plus
//! remediation tasks for the task queue).

pub mod analyzer;
pub mod commands;
pub mod config;
pub mod intervention;
pub mod log;
pub mod models;
pub mod notify;
pub mod queue;
pub mod rules;
pub mod supervisor;
pub mod utils;

pub use analyzer::{analyze, AnalysisResult, AnalyzerConfig, Health};
pub use models::event::{EventKind, LogEvent};
pub use models::issue::{Issue, IssueKind};
pub use supervisor::{Supervisor, SupervisorConfig};
