//! Rule compliance checking: the output contract of the external auditor.
//!
//! The checker's internal heuristics (file tracking, tool-call tracking)
//! live outside this crate; the supervisor only consumes `check()` results
//! and forwards tracking hints without interpreting them.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A process-rule violation reported by the compliance checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// Identifier of the violated law (e.g. "no-direct-push").
    pub law: String,
    /// Violation category within the law.
    pub kind: String,
    pub message: String,
    /// Suggested remediation, when the checker has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrective_action: Option<String>,
}

impl RuleViolation {
    /// Deduplication key, namespaced so it can never collide with an
    /// analyzer issue signature.
    pub fn signature(&self) -> String {
        format!("law|{}|{}", self.kind, self.message)
    }
}

/// External rule-compliance checker.
pub trait RuleChecker: Send + Sync {
    /// Run one compliance pass.
    fn check(&self) -> Result<Vec<RuleViolation>>;

    /// Passthrough hint: a file changed. Default no-op.
    fn track_file_change(&self, _path: &Path) {}

    /// Passthrough hint: a tool was invoked. Default no-op.
    fn track_tool_call(&self, _tool: &str) {}

    /// Passthrough hint: the feature under development changed. Default no-op.
    fn set_active_feature(&self, _feature: &str) {}
}
