//! IMDb Exporter Core Library
//!
//! This library batch-downloads IMDb ratings and list CSV exports from a
//! locally supplied CSV manifest, writing each result to a per-entry output
//! file with bounded concurrency, configurable retry, skip-if-exists
//! semantics, and live per-row status tracking.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`manifest`] - Manifest CSV loading and entry/status types
//! - [`export`] - Download mode, identifier extraction, export URLs
//! - [`auth`] - Cookie-string parsing and the session cookie set
//! - [`fetch`] - Fetch queue, retry policy and the HTTP executor
//! - [`session`] - The download orchestrator and its event stream
//! - [`settings`] - Persisted last-used paths

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod export;
pub mod fetch;
pub mod manifest;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use auth::{Cookie, CookieError, CookieSet, parse_cookie_header};
pub use export::{DEFAULT_AUTHOR_ID, DEFAULT_BASE_URL, ExportMode, ExportTemplate};
pub use fetch::{
    DEFAULT_MAX_ATTEMPTS, FailureKind, FetchError, FetchExecutor, FetchJob, FetchQueue,
    HttpFetcher, RetryDecision, RetryPolicy, classify_error,
};
pub use manifest::{
    EntryStatus, ManifestEntry, ManifestError, ManifestParse, StatusIndicator, load_manifest,
};
pub use session::{
    DEFAULT_CONCURRENCY, DownloadSession, SessionConfig, SessionError, SessionEvent, SessionState,
    SessionStats, StatusReporter,
};
pub use settings::{Settings, SettingsError, default_settings_path};
