//! The `.vigil/` directory and its config.toml.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyzer::AnalyzerConfig;
use crate::supervisor::SupervisorConfig;

const CONFIG_TEMPLATE: &str = r#"# vigil configuration

[log]
# Event log written by the supervised workflow (JSONL, one event per line).
path = ".vigil/events.jsonl"

[monitor]
# Seconds of inactivity before an active command counts as stalled.
inactivity_threshold_secs = 300
# Seconds between rule-compliance checks.
rule_check_interval_secs = 600
# Loop detection: repeats allowed / trailing events inspected.
loop_repeat_limit = 3
loop_lookback = 30
# Slowdown factor of recent event gaps vs the session average.
velocity_multiplier = 3.0
"#;

/// The supervisor's working directory (`.vigil/` under the project root).
pub struct VigilDir {
    root: PathBuf,
}

impl VigilDir {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            root: base_path.as_ref().join(".vigil"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn queue_dir(&self) -> PathBuf {
        self.root.join("queue")
    }

    pub fn default_log_path(&self) -> PathBuf {
        self.root.join("events.jsonl")
    }

    /// Create the directory structure and a config template.
    pub fn initialize(&self) -> Result<()> {
        if self.root.exists() {
            bail!(".vigil directory already exists");
        }

        fs::create_dir_all(&self.root).context("Failed to create .vigil directory")?;
        fs::create_dir(self.queue_dir()).context("Failed to create queue directory")?;
        fs::write(self.config_path(), CONFIG_TEMPLATE)
            .context("Failed to write config template")?;

        Ok(())
    }
}

/// Parsed config.toml contents. Every field has a default so a partial
/// (or absent) file still yields a working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_inactivity_secs")]
    pub inactivity_threshold_secs: u64,
    #[serde(default = "default_rule_interval_secs")]
    pub rule_check_interval_secs: u64,
    #[serde(default = "default_loop_repeat_limit")]
    pub loop_repeat_limit: usize,
    #[serde(default = "default_loop_lookback")]
    pub loop_lookback: usize,
    #[serde(default = "default_velocity_multiplier")]
    pub velocity_multiplier: f64,
}

fn default_inactivity_secs() -> u64 {
    300
}
fn default_rule_interval_secs() -> u64 {
    600
}
fn default_loop_repeat_limit() -> usize {
    3
}
fn default_loop_lookback() -> usize {
    30
}
fn default_velocity_multiplier() -> f64 {
    3.0
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: default_inactivity_secs(),
            rule_check_interval_secs: default_rule_interval_secs(),
            loop_repeat_limit: default_loop_repeat_limit(),
            loop_lookback: default_loop_lookback(),
            velocity_multiplier: default_velocity_multiplier(),
        }
    }
}

impl Settings {
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            inactivity_threshold: Duration::from_secs(self.monitor.inactivity_threshold_secs),
            loop_repeat_limit: self.monitor.loop_repeat_limit,
            loop_lookback: self.monitor.loop_lookback,
            velocity_multiplier: self.monitor.velocity_multiplier,
            ..AnalyzerConfig::default()
        }
    }

    pub fn supervisor_config(&self, dir: &VigilDir) -> SupervisorConfig {
        SupervisorConfig {
            state_path: dir.state_path(),
            rule_check_interval: Duration::from_secs(self.monitor.rule_check_interval_secs),
            continuous: true,
            analyzer: self.analyzer_config(),
        }
    }

    /// Resolve the event-log path: explicit setting, else the default
    /// location inside the vigil dir.
    pub fn log_path(&self, dir: &VigilDir) -> PathBuf {
        self.log
            .path
            .clone()
            .unwrap_or_else(|| dir.default_log_path())
    }
}

/// Load and parse config.toml from a vigil directory.
///
/// # Returns
/// * `Ok(Some(settings))` - config loaded and parsed
/// * `Ok(None)` - config file doesn't exist
/// * `Err(_)` - failed to read or parse
pub fn load_settings(dir: &VigilDir) -> Result<Option<Settings>> {
    let config_path = dir.config_path();

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).context("Failed to read config.toml")?;
    let settings: Settings = toml::from_str(&content).context("Failed to parse config.toml")?;

    Ok(Some(settings))
}

/// Load config.toml, or fall back to defaults when it doesn't exist.
pub fn load_settings_or_default(dir: &VigilDir) -> Result<Settings> {
    Ok(load_settings(dir)?.unwrap_or_default())
}
