//! Fetch plumbing: the job queue, the retry policy and the HTTP executor.
//!
//! # Overview
//!
//! - [`FetchQueue`] / [`FetchJob`] - in-memory FIFO of pending fetches
//! - [`FetchExecutor`] / [`HttpFetcher`] - one-shot transport
//! - [`RetryPolicy`] - pluggable decision on what happens after a failure
//! - [`FetchError`] - structured failure reasons
//!
//! The session module wires these together; nothing here knows about
//! manifest entries or output files.

mod client;
mod error;
mod queue;
mod retry;

pub use client::{FetchExecutor, HttpFetcher};
pub use error::FetchError;
pub use queue::{FetchJob, FetchQueue};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureKind, RetryDecision, RetryPolicy, classify_error,
};
