//! In-memory FIFO queue of pending fetch jobs.
//!
//! The queue never persists across restarts and has no priorities: jobs are
//! served strictly front-to-back. A retried job is re-enqueued at the tail,
//! so other waiting jobs are served first.

use std::collections::VecDeque;
use std::time::Duration;

/// One queued or in-flight fetch attempt for a manifest entry.
///
/// Owned by the [`FetchQueue`] until dispatched; ownership transfers to the
/// in-flight task. On failure a new job with an incremented attempt count
/// returns to the queue. At most one job per entry is queued or in flight at
/// any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Index of the entry this job fetches for.
    pub entry_index: usize,
    /// Constructed export request URL.
    pub url: String,
    /// Attempt number this job represents (1-indexed).
    pub attempt: u32,
    /// Backoff delay to sleep before fetching, set by the retry policy.
    pub retry_delay: Option<Duration>,
}

impl FetchJob {
    /// Creates a first-attempt job with no delay.
    #[must_use]
    pub fn new(entry_index: usize, url: impl Into<String>) -> Self {
        Self {
            entry_index,
            url: url.into(),
            attempt: 1,
            retry_delay: None,
        }
    }

    /// Creates the follow-up job for a failed attempt.
    #[must_use]
    pub fn retry(entry_index: usize, url: impl Into<String>, attempt: u32, delay: Duration) -> Self {
        Self {
            entry_index,
            url: url.into(),
            attempt,
            retry_delay: (!delay.is_zero()).then_some(delay),
        }
    }
}

/// FIFO ordered collection of [`FetchJob`]s.
#[derive(Debug, Default)]
pub struct FetchQueue {
    jobs: VecDeque<FetchJob>,
}

impl FetchQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the tail. No de-duplication.
    pub fn enqueue(&mut self, job: FetchJob) {
        self.jobs.push_back(job);
    }

    /// Removes and returns the head job, or `None` when empty.
    pub fn dequeue_front(&mut self) -> Option<FetchJob> {
        self.jobs.pop_front()
    }

    /// Returns the number of queued jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true when no jobs are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
