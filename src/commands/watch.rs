use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{load_settings_or_default, VigilDir};
use crate::log::JsonlEventSource;
use crate::notify::DesktopNotifier;
use crate::queue::FileTaskQueue;
use crate::supervisor::Supervisor;

/// Run the supervisor in the foreground until Ctrl-C.
pub fn execute(log_override: Option<PathBuf>) -> Result<()> {
    let dir = VigilDir::new(".");
    let settings = load_settings_or_default(&dir)?;
    let log_path = log_override.unwrap_or_else(|| settings.log_path(&dir));

    let supervisor = Supervisor::new(
        settings.supervisor_config(&dir),
        Arc::new(JsonlEventSource::new(&log_path)),
        Arc::new(DesktopNotifier),
        Arc::new(FileTaskQueue::new(dir.queue_dir())),
    );

    supervisor.on_analyze(|result| {
        let health = match result.health {
            crate::analyzer::Health::Healthy => "healthy".green(),
            crate::analyzer::Health::Degraded => "degraded".yellow(),
            crate::analyzer::Health::Critical => "critical".red().bold(),
        };
        let active = result.current_command.as_deref().unwrap_or("-");
        println!(
            "[{health}] active={active} issues={}",
            result.issues.len()
        );
    });
    supervisor.on_notify(|title, message| {
        println!("{} {title}: {message}", "!".red().bold());
    });

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    supervisor.start();
    println!(
        "Watching {} (Ctrl-C to stop)",
        log_path.display().to_string().bold()
    );

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    println!("\nStopping...");
    supervisor.stop();
    Ok(())
}
