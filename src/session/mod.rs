//! Download session orchestration.
//!
//! [`DownloadSession`] is the request-queue engine: it turns parsed manifest
//! entries into a bounded set of concurrent fetches, tracks each outcome,
//! retries failures through the configured policy, and reports every status
//! transition on the event stream.
//!
//! # Concurrency model
//!
//! One coordinator (the `run` loop) owns all shared state — entries, queue,
//! in-flight count. Each fetch runs in its own Tokio task that does nothing
//! but sleep its backoff, call the executor, and send the outcome over a
//! single completion channel back to the coordinator. Completions arrive in
//! any order; correlation back to an entry goes through identifier
//! re-extraction, never dispatch order. No locks: the single-writer
//! invariant holds by construction.
//!
//! # Dispatch discipline
//!
//! On start the coordinator fills up to the concurrency limit. Every
//! completion frees exactly one slot and refills exactly one job
//! (refill-one). A job whose destination already exists under
//! overwrite-disabled is skipped at dispatch time — it never consumes a
//! slot, and the same refill step moves on to the next queued job.

mod events;

pub use events::{SessionEvent, SessionState, StatusReporter};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::export::ExportTemplate;
use crate::fetch::{
    FetchError, FetchExecutor, FetchJob, FetchQueue, RetryDecision, RetryPolicy, classify_error,
};
use crate::manifest::{EntryStatus, ManifestEntry};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Error type for session configuration and coordination.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The manifest produced no entries.
    #[error("manifest produced no entries to download")]
    EmptyManifest,

    /// The output directory could not be created or used.
    #[error("output directory {path} is not usable: {source}")]
    OutputDir {
        /// The configured output directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The completion channel closed with jobs still in flight.
    #[error("completion channel closed unexpectedly")]
    ChannelClosed,
}

/// Session-wide configuration, validated before the session starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum simultaneous in-flight fetches (1-100).
    pub concurrency: usize,
    /// Overwrite existing destination files instead of skipping.
    pub overwrite: bool,
    /// Directory receiving `{label}.csv` files.
    pub output_dir: PathBuf,
    /// What happens after a failed fetch.
    pub retry_policy: RetryPolicy,
}

impl SessionConfig {
    /// Creates a config with defaults: concurrency 4, no overwrite, default
    /// retry policy.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            overwrite: false,
            output_dir: output_dir.into(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Counters from one session run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    saved: usize,
    skipped: usize,
    failed: usize,
    retried: usize,
    anomalies: usize,
}

impl SessionStats {
    /// Entries whose export was written to disk.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Entries skipped because the destination already existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Entries the retry policy gave up on.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Retry re-enqueues performed (one per failed attempt that retried).
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried
    }

    /// Completions dropped because correlation failed.
    #[must_use]
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }
}

/// Outcome of one in-flight fetch task, delivered to the coordinator.
#[derive(Debug)]
struct TaskCompletion {
    url: String,
    attempt: u32,
    outcome: Result<Vec<u8>, FetchError>,
}

/// One download session over a parsed manifest.
///
/// Owns every piece of mutable session state (entries, queue, lifecycle
/// state) so independent sessions can coexist and tests need no globals.
pub struct DownloadSession {
    entries: Vec<ManifestEntry>,
    template: ExportTemplate,
    config: SessionConfig,
    reporter: StatusReporter,
    queue: FetchQueue,
    state: SessionState,
}

impl DownloadSession {
    /// Creates a session over `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConcurrency`] for a concurrency value
    /// outside 1-100 and [`SessionError::EmptyManifest`] when `entries` is
    /// empty. Both are configuration errors: the session never starts.
    #[instrument(level = "debug", skip(entries, template, config, reporter), fields(entries = entries.len(), concurrency = config.concurrency))]
    pub fn new(
        entries: Vec<ManifestEntry>,
        template: ExportTemplate,
        config: SessionConfig,
        reporter: StatusReporter,
    ) -> Result<Self, SessionError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(SessionError::InvalidConcurrency {
                value: config.concurrency,
            });
        }
        if entries.is_empty() {
            return Err(SessionError::EmptyManifest);
        }

        debug!(
            entries = entries.len(),
            concurrency = config.concurrency,
            overwrite = config.overwrite,
            mode = %template.mode(),
            "creating download session"
        );

        Ok(Self {
            entries,
            template,
            config,
            reporter,
            queue: FetchQueue::new(),
            state: SessionState::Idle,
        })
    }

    /// Returns the entries with their current statuses.
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion.
    ///
    /// Individual fetch failures never error this method — they are retried
    /// or recorded in the stats. The session ends when the queue is empty
    /// and no fetches remain in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::OutputDir`] when the output directory cannot
    /// be created, or [`SessionError::ChannelClosed`] if the completion
    /// channel dies with jobs in flight (a bug, not an expected condition).
    #[instrument(skip(self, executor), fields(output_dir = %self.config.output_dir.display()))]
    pub async fn run(
        &mut self,
        executor: Arc<dyn FetchExecutor>,
    ) -> Result<SessionStats, SessionError> {
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| SessionError::OutputDir {
                path: self.config.output_dir.clone(),
                source: e,
            })?;

        self.build_queue();
        info!(jobs = self.queue.len(), "starting session");

        let mut stats = SessionStats::default();
        let (tx, mut rx) = mpsc::channel::<TaskCompletion>(self.config.concurrency);
        let mut in_flight = 0usize;

        self.set_state(SessionState::Running);

        // Initial fill: up to min(concurrency, queue length) slots.
        while in_flight < self.config.concurrency {
            if !self.dispatch_one(&tx, &executor, &mut stats) {
                break;
            }
            in_flight += 1;
        }
        self.sync_state(in_flight);

        // Completion-driven refill: each received outcome frees a slot and
        // dispatches at most one more job.
        while in_flight > 0 {
            let Some(done) = rx.recv().await else {
                return Err(SessionError::ChannelClosed);
            };
            in_flight -= 1;

            self.handle_completion(done, &mut stats).await;

            if self.dispatch_one(&tx, &executor, &mut stats) {
                in_flight += 1;
            }
            self.sync_state(in_flight);
        }

        info!(
            saved = stats.saved,
            skipped = stats.skipped,
            failed = stats.failed,
            retried = stats.retried,
            anomalies = stats.anomalies,
            "session complete"
        );

        Ok(stats)
    }

    /// Builds one first-attempt job per entry and reports duplicate
    /// identifiers.
    fn build_queue(&mut self) {
        for (index, entry) in self.entries.iter().enumerate() {
            let url = self.template.export_url(&entry.source_id);
            debug!(label = %entry.label, %url, "enqueued");
            self.queue.enqueue(FetchJob::new(index, url));
        }

        // Correlation assumes unique identifiers. Duplicates are flagged up
        // front; their completions will also be dropped as ambiguous.
        let mut seen: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();
        for entry in &self.entries {
            if let Some(first) = seen.insert(&entry.source_id, &entry.label) {
                let reason = format!(
                    "identifier {} shared by rows {first} and {}",
                    entry.source_id, entry.label
                );
                warn!(%reason, "duplicate identifier in manifest");
                self.reporter.emit(SessionEvent::CorrelationAnomaly {
                    url: self.template.export_url(&entry.source_id),
                    reason,
                });
            }
        }
    }

    /// Dispatches the next dispatchable job, skipping entries whose
    /// destination already exists when overwrite is disabled.
    ///
    /// Returns true when a fetch task was spawned; false when the queue ran
    /// out of dispatchable jobs.
    fn dispatch_one(
        &mut self,
        tx: &mpsc::Sender<TaskCompletion>,
        executor: &Arc<dyn FetchExecutor>,
        stats: &mut SessionStats,
    ) -> bool {
        while let Some(job) = self.queue.dequeue_front() {
            let destination = self.entries[job.entry_index].output_path(&self.config.output_dir);

            // Checked at dispatch time, not enqueue time, so retries re-check
            // too.
            if !self.config.overwrite && destination.exists() {
                debug!(
                    label = %self.entries[job.entry_index].label,
                    path = %destination.display(),
                    "destination exists; skipping"
                );
                self.set_entry_status(job.entry_index, EntryStatus::Skipped);
                stats.skipped += 1;
                continue;
            }

            self.set_entry_status(job.entry_index, EntryStatus::Downloading);

            let tx = tx.clone();
            let executor = Arc::clone(executor);
            let FetchJob {
                url,
                attempt,
                retry_delay,
                ..
            } = job;

            tokio::spawn(async move {
                if let Some(delay) = retry_delay {
                    tokio::time::sleep(delay).await;
                }
                let outcome = executor.fetch(&url).await;
                // A send failure means the coordinator is gone; the outcome
                // is moot.
                let _ = tx
                    .send(TaskCompletion {
                        url,
                        attempt,
                        outcome,
                    })
                    .await;
            });

            return true;
        }

        false
    }

    /// Applies one completion: correlate, then persist or retry.
    async fn handle_completion(&mut self, done: TaskCompletion, stats: &mut SessionStats) {
        let index = match self.correlate(&done.url) {
            Ok(index) => index,
            Err(reason) => {
                warn!(url = %done.url, %reason, "dropping uncorrelatable completion");
                stats.anomalies += 1;
                self.reporter.emit(SessionEvent::CorrelationAnomaly {
                    url: done.url,
                    reason,
                });
                return;
            }
        };

        match done.outcome {
            Ok(body) => {
                let destination = self.entries[index].output_path(&self.config.output_dir);
                match tokio::fs::write(&destination, &body).await {
                    Ok(()) => {
                        info!(
                            label = %self.entries[index].label,
                            path = %destination.display(),
                            bytes = body.len(),
                            "export saved"
                        );
                        self.set_entry_status(index, EntryStatus::Saved);
                        stats.saved += 1;
                    }
                    Err(e) => {
                        // Retrying cannot fix a bad output directory; give up
                        // on this entry but keep the session alive.
                        let error = FetchError::io(destination, e);
                        warn!(label = %self.entries[index].label, %error, "failed to persist export");
                        self.set_entry_status(index, EntryStatus::Failed);
                        stats.failed += 1;
                    }
                }
            }
            Err(error) => {
                let kind = classify_error(&error);
                match self.config.retry_policy.should_retry(kind, done.attempt) {
                    RetryDecision::Retry { delay, attempt } => {
                        warn!(
                            label = %self.entries[index].label,
                            %error,
                            attempt,
                            delay_ms = delay.as_millis(),
                            "fetch failed; retrying"
                        );
                        self.set_entry_status(index, EntryStatus::FailedRetrying);
                        stats.retried += 1;
                        self.queue
                            .enqueue(FetchJob::retry(index, done.url, attempt, delay));
                    }
                    RetryDecision::GiveUp { reason } => {
                        warn!(
                            label = %self.entries[index].label,
                            %error,
                            %reason,
                            "giving up on entry"
                        );
                        self.set_entry_status(index, EntryStatus::Failed);
                        stats.failed += 1;
                    }
                }
            }
        }
    }

    /// Resolves a completed request URL to exactly one entry by re-extracting
    /// the identifier — the same lookup the original performed per reply.
    fn correlate(&self, url: &str) -> Result<usize, String> {
        let Some(id) = self.template.extract_id(url) else {
            return Err("no identifier in completed request URL".to_string());
        };

        let mut found = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.source_id == id {
                if found.is_some() {
                    return Err(format!("identifier {id} matches more than one manifest row"));
                }
                found = Some(index);
            }
        }

        found.ok_or_else(|| format!("identifier {id} matches no manifest row"))
    }

    /// Updates an entry's status and emits the transition.
    fn set_entry_status(&mut self, index: usize, status: EntryStatus) {
        self.entries[index].status = status;
        self.reporter.emit(SessionEvent::StatusChanged {
            entry_index: index,
            label: self.entries[index].label.clone(),
            status,
        });
    }

    /// Recomputes the lifecycle state from queue/in-flight occupancy and
    /// emits on change. A retry re-enqueue during `Draining` moves the
    /// session back to `Running`.
    fn sync_state(&mut self, in_flight: usize) {
        let next = if in_flight == 0 && self.queue.is_empty() {
            SessionState::Idle
        } else if self.queue.is_empty() {
            SessionState::Draining
        } else {
            SessionState::Running
        };
        self.set_state(next);
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "session state change");
            self.state = next;
            self.reporter.emit(SessionEvent::StateChanged { state: next });
        }
    }
}
