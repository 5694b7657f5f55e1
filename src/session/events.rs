//! Session event stream.
//!
//! Status and lifecycle updates leave the core as events on a channel; the
//! consumer (CLI renderer, tests, nothing at all) decides what to do with
//! them. The core never blocks on a slow or absent consumer.

use std::fmt;

use tokio::sync::mpsc;

use crate::manifest::EntryStatus;

/// Lifecycle state of a download session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session running.
    Idle,
    /// Dispatch capacity exists: the queue still holds jobs.
    Running,
    /// Queue empty, jobs still in flight.
    Draining,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
        }
    }
}

/// One observable session occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An entry moved to a new status.
    StatusChanged {
        /// Index of the entry in manifest order.
        entry_index: usize,
        /// The entry's label, for display without a lookup.
        label: String,
        /// The new status.
        status: EntryStatus,
    },
    /// The session moved to a new lifecycle state.
    StateChanged {
        /// The new state.
        state: SessionState,
    },
    /// A completed fetch could not be matched to exactly one entry; its
    /// transition was dropped rather than applied to the wrong row.
    CorrelationAnomaly {
        /// The completed request URL.
        url: String,
        /// Why resolution failed.
        reason: String,
    },
}

/// Emits session events to an optional consumer.
///
/// A disabled reporter, or one whose receiver has been dropped, silently
/// discards events.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl StatusReporter {
    /// Creates a reporter that discards every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Creates a connected reporter and the receiving end of its stream.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Emits an event, ignoring a missing or disconnected consumer.
    pub fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
