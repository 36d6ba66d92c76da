//! Desktop notification support for supervisor interventions.
//!
//! Sends desktop notifications for issues that need human attention,
//! using notify-send on Linux and osascript on macOS.

use anyhow::{bail, Result};
use std::process::Command;

/// Sink for user-facing notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str, sound: &str) -> Result<()>;
}

/// Platform desktop notifier.
///
/// - Linux: `notify-send`
/// - macOS: `osascript` with display notification
///
/// Callers treat delivery as best-effort; failures are reported but the
/// supervisor never propagates them.
pub struct DesktopNotifier;

impl NotificationSink for DesktopNotifier {
    fn notify(&self, title: &str, message: &str, sound: &str) -> Result<()> {
        if cfg!(target_os = "macos") {
            send_macos_notification(title, message, sound)
        } else {
            send_linux_notification(title, message, sound)
        }
    }
}

fn send_linux_notification(title: &str, body: &str, sound: &str) -> Result<()> {
    let urgency = match sound {
        "critical" => "--urgency=critical",
        "warning" => "--urgency=normal",
        _ => "--urgency=low",
    };

    let output = Command::new("notify-send")
        .arg(urgency)
        .arg("--app-name=vigil")
        .arg(title)
        .arg(body)
        .output()
        .map_err(|e| anyhow::anyhow!("notify-send failed: {e}"))?;

    if !output.status.success() {
        bail!("notify-send exited with: {}", output.status);
    }
    Ok(())
}

fn send_macos_notification(title: &str, body: &str, sound: &str) -> Result<()> {
    let sound_name = match sound {
        "critical" => "Basso",
        "warning" => "Funk",
        _ => "Tink",
    };
    let script = format!(
        r#"display notification "{}" with title "{}" sound name "{}""#,
        escape_applescript_string(body),
        escape_applescript_string(title),
        sound_name
    );

    let output = Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .map_err(|e| anyhow::anyhow!("osascript failed: {e}"))?;

    if !output.status.success() {
        bail!("osascript exited with: {}", output.status);
    }
    Ok(())
}

/// Escape a string for embedding in a double-quoted AppleScript literal.
fn escape_applescript_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
