//! Event source: the append-only workflow log.

mod jsonl;

pub use jsonl::JsonlEventSource;

use anyhow::Result;

use crate::models::event::LogEvent;

/// Callback invoked for each event delivered by the live tail.
pub type EventCallback = Box<dyn FnMut(LogEvent) + Send>;

/// Read access to the workflow event log.
///
/// `read_all` is a restartable full replay. `tail` is push-based and not
/// restartable: subscribing delivers events appended from "now" onward,
/// never historical ones.
pub trait EventSource: Send + Sync {
    /// Replay the full event history in append order.
    fn read_all(&self) -> Result<Vec<LogEvent>>;

    /// Start delivering newly appended events to `on_event`.
    fn tail(&self, on_event: EventCallback) -> Result<()>;

    /// Stop the live tail. Idempotent; no-op if no tail is active.
    fn stop_tail(&self);
}
