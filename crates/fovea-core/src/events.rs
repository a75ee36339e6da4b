//! Scan event types and the event bus for progress reporting.
//!
//! The orchestrator emits a sequence of typed events per scan cycle to a
//! broadcast channel. Downstream consumers (a CLI progress line, a log
//! shipper, tests) subscribe independently; there is no ownership
//! relationship between the orchestrator and its listeners.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::defaults;
use crate::models::ScanStatus;

/// Per-item and per-cycle events emitted by the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// A scan cycle began after batch setup succeeded.
    ScanStarted {
        scan_id: Uuid,
        /// Candidates remaining after dedup filtering.
        candidates: usize,
        started_at: DateTime<Utc>,
    },
    /// One candidate ran through the pipeline without error.
    ItemProcessed {
        scan_id: Uuid,
        asset_id: String,
        /// Extraction-declared category, or `"-"` when extraction was
        /// gated off by the pre-filter in whole-library mode.
        category: String,
        /// Vault-relative path written, absent for skip outcomes.
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        written: bool,
    },
    /// One candidate failed; the rest of the batch continues.
    ItemFailed {
        scan_id: Uuid,
        asset_id: String,
        error: String,
    },
    /// The scan cycle reached a terminal status.
    ScanFinished {
        scan_id: Uuid,
        status: ScanStatus,
        found: usize,
        extracted: usize,
        written: usize,
        errors: usize,
    },
    /// The watch loop started.
    WatcherStarted,
    /// The watch loop stopped (in-flight cycle already finished).
    WatcherStopped,
}

/// Broadcast bus carrying [`ScanEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScanEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. If there are no active
    /// subscribers, the event is dropped without error.
    pub fn emit(&self, event: ScanEvent) {
        tracing::trace!(
            subscriber_count = self.tx.receiver_count(),
            ?event,
            "event emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to events. Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(defaults::EVENT_BUS_CAPACITY)
    }
}
