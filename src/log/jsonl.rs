//! JSONL-file event source.
//!
//! One event per line. `read_all` parses the whole file; `tail` polls the
//! file for growth on a background thread, delivering complete lines
//! appended after subscription. Malformed lines are logged and skipped,
//! never fatal.

use anyhow::{Context, Result};
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{EventCallback, EventSource};
use crate::models::event::{EventParseError, LogEvent};

pub struct JsonlEventSource {
    path: PathBuf,
    poll_interval: Duration,
    stop_flag: Arc<AtomicBool>,
    tail_handle: Mutex<Option<JoinHandle<()>>>,
}

impl JsonlEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_poll_interval(path, Duration::from_millis(200))
    }

    pub fn with_poll_interval(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            stop_flag: Arc::new(AtomicBool::new(false)),
            tail_handle: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a chunk of log text, skipping bad lines with a warning.
fn parse_lines(content: &str) -> Vec<LogEvent> {
    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        match LogEvent::parse_line(line) {
            Ok(event) => events.push(event),
            Err(EventParseError::Empty) => {}
            Err(e) => {
                tracing::warn!("skipping malformed log line {}: {e}", idx + 1);
            }
        }
    }
    events
}

impl EventSource for JsonlEventSource {
    fn read_all(&self) -> Result<Vec<LogEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read event log {}", self.path.display()))?;
        Ok(parse_lines(&content))
    }

    fn tail(&self, mut on_event: EventCallback) -> Result<()> {
        let mut handle = self
            .tail_handle
            .lock()
            .expect("tail handle lock poisoned");
        if handle.is_some() {
            // Already tailing; the existing subscription stands.
            return Ok(());
        }

        self.stop_flag.store(false, Ordering::SeqCst);
        let stop_flag = Arc::clone(&self.stop_flag);
        let path = self.path.clone();
        let poll_interval = self.poll_interval;

        // Resubscription starts from "now": begin at the current end of file.
        let mut offset = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        let thread = thread::spawn(move || {
            // Carry-over for a line whose newline hasn't been written yet.
            let mut pending = String::new();

            while !stop_flag.load(Ordering::SeqCst) {
                let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                if len < offset {
                    // Log was truncated or rotated; restart from its new end.
                    offset = len;
                    pending.clear();
                } else if len > offset {
                    match read_from(&path, offset) {
                        Ok(chunk) => {
                            offset = len;
                            pending.push_str(&chunk);
                            for line in drain_complete_lines(&mut pending) {
                                match LogEvent::parse_line(&line) {
                                    Ok(event) => on_event(event),
                                    Err(EventParseError::Empty) => {}
                                    Err(e) => {
                                        tracing::warn!("skipping malformed log line: {e}");
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("tail read failed, will retry: {e}");
                        }
                    }
                }

                thread::sleep(poll_interval);
            }
        });

        *handle = Some(thread);
        Ok(())
    }

    fn stop_tail(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        let handle = self
            .tail_handle
            .lock()
            .expect("tail handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for JsonlEventSource {
    fn drop(&mut self) {
        self.stop_tail();
    }
}

fn read_from(path: &Path, offset: u64) -> Result<String> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("Failed to open event log {}", path.display()))?;
    file.seek(SeekFrom::Start(offset))
        .context("Failed to seek event log")?;
    let mut chunk = String::new();
    file.read_to_string(&mut chunk)
        .context("Failed to read event log")?;
    Ok(chunk)
}

/// Split off complete (newline-terminated) lines, keeping any partial
/// trailing line in the buffer.
fn drain_complete_lines(buffer: &mut String) -> Vec<String> {
    let Some(last_newline) = buffer.rfind('\n') else {
        return Vec::new();
    };
    let complete: String = buffer.drain(..=last_newline).collect();
    complete
        .lines()
        .map(|line| line.to_string())
        .collect()
}
