//! Progress events for long-running harvests.
//!
//! The pipeline emits `ProgressEvent`s through a `tokio::sync::broadcast`
//! channel to any subscriber (the CLI progress bar, tests). When no
//! subscriber exists, events are silently dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A progress event emitted during a harvest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// Work on a category directory has started.
    CategoryStarted { category: String, searches: usize },
    /// A search term returned candidate URLs.
    SearchCompleted { term: String, found: usize },
    /// Content-type probing finished for a search term.
    UrlsFiltered {
        term: String,
        kept: usize,
        dropped: usize,
    },
    /// A download batch finished.
    DownloadCompleted {
        term: String,
        saved: usize,
        failed: usize,
    },
    /// The category directory was resized in place.
    Resized {
        category: String,
        resized: usize,
        total: usize,
    },
    /// Unreadable images were deleted.
    Pruned { category: String, failed: usize },
    /// The category is finished.
    CategoryCompleted { category: String, elapsed_ms: u64 },
    /// Pausing between searches.
    Waiting { seconds: u64 },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Stamps events with sequence numbers and forwards them to an optional channel.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sender: Option<ProgressSender>,
    seq: Arc<AtomicU64>,
}

impl ProgressReporter {
    pub fn new(sender: ProgressSender) -> Self {
        Self {
            sender: Some(sender),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A reporter that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Subscribe to future events, if a channel is attached.
    pub fn subscribe(&self) -> Option<ProgressReceiver> {
        self.sender.as_ref().map(|s| s.subscribe())
    }

    /// Emit an event, silently ignoring the case where nobody is listening.
    pub fn emit(&self, event: ProgressEventKind) {
        let Some(sender) = &self.sender else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = sender.send(ProgressEvent { seq, event });
    }
}
