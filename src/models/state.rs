use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::chain::ChainProgress;

/// Persisted snapshot of workflow progress.
///
/// This is a projection of the latest analysis, owned exclusively by the
/// supervisor and overwritten after every processed event or rule check.
/// It exists so `vigil status` and a restarted supervisor have something
/// to show before the first new event arrives; analysis itself always runs
/// over the full event history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub chain: ChainProgress,
    #[serde(default)]
    pub milestones: Vec<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl WorkflowState {
    /// Load a snapshot from disk.
    ///
    /// # Returns
    /// * `Ok(Some(state))` - file existed and parsed
    /// * `Ok(None)` - file absent, or present but unreadable/corrupt
    ///   (callers fall back to replaying the event source)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("failed to read state snapshot {}: {e}", path.display());
                return Ok(None);
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!(
                    "corrupt state snapshot {}, will rebuild from log: {e}",
                    path.display()
                );
                Ok(None)
            }
        }
    }

    /// Write the snapshot to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
