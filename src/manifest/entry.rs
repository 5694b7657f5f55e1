//! Manifest entry types and status definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Lifecycle status of a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Waiting to be dispatched.
    Waiting,
    /// A fetch for this entry is in flight.
    Downloading,
    /// Response body written to the output file.
    Saved,
    /// Destination file already existed and overwrite was disabled.
    Skipped,
    /// Last attempt failed; a retry is queued.
    FailedRetrying,
    /// The retry policy gave up on this entry.
    Failed,
}

impl EntryStatus {
    /// Returns the stable string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Downloading => "downloading",
            Self::Saved => "saved",
            Self::Skipped => "skipped",
            Self::FailedRetrying => "failed_retrying",
            Self::Failed => "failed",
        }
    }

    /// Returns true if no further transitions can occur for this entry.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Saved | Self::Skipped | Self::Failed)
    }

    /// Maps the status to the visual indicator shown by a renderer.
    #[must_use]
    pub fn indicator(&self) -> StatusIndicator {
        match self {
            Self::Waiting | Self::Skipped => StatusIndicator::Idle,
            Self::Downloading => StatusIndicator::InProgress,
            Self::Saved => StatusIndicator::Success,
            Self::FailedRetrying | Self::Failed => StatusIndicator::Failure,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "downloading" => Ok(Self::Downloading),
            "saved" => Ok(Self::Saved),
            "skipped" => Ok(Self::Skipped),
            "failed_retrying" => Ok(Self::FailedRetrying),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid entry status: {s}")),
        }
    }
}

/// Visual highlight class for an entry row.
///
/// Decouples the core from any rendering technology: a renderer maps these
/// to colors (the original tool used yellow/green/red row highlights).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    /// No highlight.
    Idle,
    /// Fetch in flight.
    InProgress,
    /// Output persisted.
    Success,
    /// Last attempt failed.
    Failure,
}

/// One manifest row plus derived request state.
///
/// Created when the manifest is parsed; mutated only by the session
/// (status transitions); lives for one download session.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// Output filename stem (column 0 of the manifest, non-empty).
    pub label: String,
    /// Source URL as it appeared in the manifest (column 1).
    pub source_url: String,
    /// Mode-specific identifier extracted from `source_url`.
    pub source_id: String,
    /// Current lifecycle status.
    pub status: EntryStatus,
}

impl ManifestEntry {
    /// Creates a new entry in the `Waiting` state.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        source_url: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            source_url: source_url.into(),
            source_id: source_id.into(),
            status: EntryStatus::Waiting,
        }
    }

    /// Derived destination path: `{output_dir}/{label}.csv`.
    #[must_use]
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.csv", self.label))
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ManifestEntry {{ label: {}, id: {}, status: {} }}",
            self.label, self.source_id, self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_status_as_str() {
        assert_eq!(EntryStatus::Waiting.as_str(), "waiting");
        assert_eq!(EntryStatus::Downloading.as_str(), "downloading");
        assert_eq!(EntryStatus::Saved.as_str(), "saved");
        assert_eq!(EntryStatus::Skipped.as_str(), "skipped");
        assert_eq!(EntryStatus::FailedRetrying.as_str(), "failed_retrying");
        assert_eq!(EntryStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_entry_status_from_str_roundtrip() {
        for status in [
            EntryStatus::Waiting,
            EntryStatus::Downloading,
            EntryStatus::Saved,
            EntryStatus::Skipped,
            EntryStatus::FailedRetrying,
            EntryStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<EntryStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_entry_status_from_str_invalid() {
        let result = "exploded".parse::<EntryStatus>();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("invalid entry status"));
    }

    #[test]
    fn test_entry_status_terminal_states() {
        assert!(!EntryStatus::Waiting.is_terminal());
        assert!(!EntryStatus::Downloading.is_terminal());
        assert!(!EntryStatus::FailedRetrying.is_terminal());
        assert!(EntryStatus::Saved.is_terminal());
        assert!(EntryStatus::Skipped.is_terminal());
        assert!(EntryStatus::Failed.is_terminal());
    }

    #[test]
    fn test_entry_status_indicator_mapping() {
        assert_eq!(EntryStatus::Downloading.indicator(), StatusIndicator::InProgress);
        assert_eq!(EntryStatus::Saved.indicator(), StatusIndicator::Success);
        assert_eq!(EntryStatus::FailedRetrying.indicator(), StatusIndicator::Failure);
        assert_eq!(EntryStatus::Failed.indicator(), StatusIndicator::Failure);
        assert_eq!(EntryStatus::Waiting.indicator(), StatusIndicator::Idle);
    }

    #[test]
    fn test_entry_status_serde_labels() {
        let json = serde_json::to_string(&EntryStatus::FailedRetrying).unwrap();
        assert_eq!(json, "\"failed_retrying\"");
        let parsed: EntryStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EntryStatus::FailedRetrying);
    }

    #[test]
    fn test_manifest_entry_starts_waiting() {
        let entry = ManifestEntry::new("alice", "http://www.imdb.com/user/ur1234567/", "1234567");
        assert_eq!(entry.status, EntryStatus::Waiting);
        assert_eq!(entry.label, "alice");
        assert_eq!(entry.source_id, "1234567");
    }

    #[test]
    fn test_manifest_entry_output_path() {
        let entry = ManifestEntry::new("alice", "http://example.com", "1234567");
        let path = entry.output_path(Path::new("/tmp/out"));
        assert_eq!(path, PathBuf::from("/tmp/out/alice.csv"));
    }

    #[test]
    fn test_manifest_entry_display() {
        let entry = ManifestEntry::new("bob", "http://example.com", "7654321");
        let display = entry.to_string();
        assert!(display.contains("bob"));
        assert!(display.contains("7654321"));
        assert!(display.contains("waiting"));
    }
}
