//! Download mode, identifier extraction and export URL construction.
//!
//! IMDb exposes two CSV export endpoints, both parameterized by identifiers
//! embedded in profile/list URLs:
//! - ratings: `.../list/export?list_id=ratings&author_id=ur{id}` where `{id}`
//!   is the 7-8 digit user id (`ur` prefix) from the manifest URL;
//! - lists: `.../list/export?list_id=ls{id}&author_id=ur{author}` where
//!   `{id}` is the 9 digit list id (`ls` prefix) and `{author}` is a fixed
//!   session-wide author id.
//!
//! The same extraction is used twice: once to build the request URL for a
//! manifest row, and again to correlate a completed fetch back to its row.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Fixed author id used by the list export endpoint.
pub const DEFAULT_AUTHOR_ID: &str = "27588704";

/// Default IMDb origin for export URLs.
pub const DEFAULT_BASE_URL: &str = "https://www.imdb.com";

#[allow(clippy::expect_used)]
static RATINGS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ur([0-9]{7,8})").expect("ratings id pattern is valid"));

#[allow(clippy::expect_used)]
static LIST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ls([0-9]{9})").expect("list id pattern is valid"));

/// Session-wide toggle selecting which URL template and identifier pattern
/// applies. Never varies per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Export a user's ratings; rows identify users (`ur` + 7-8 digits).
    Ratings,
    /// Export a list; rows identify lists (`ls` + 9 digits).
    Lists,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ratings => write!(f, "ratings"),
            Self::Lists => write!(f, "lists"),
        }
    }
}

/// Builds export request URLs and extracts row identifiers for one session.
#[derive(Debug, Clone)]
pub struct ExportTemplate {
    mode: ExportMode,
    base_url: String,
    author_id: String,
}

impl ExportTemplate {
    /// Creates a template with the default IMDb origin and author id.
    #[must_use]
    pub fn new(mode: ExportMode) -> Self {
        Self {
            mode,
            base_url: DEFAULT_BASE_URL.to_string(),
            author_id: DEFAULT_AUTHOR_ID.to_string(),
        }
    }

    /// Overrides the request origin (used by tests to point at a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the fixed author id used by the list export endpoint.
    #[must_use]
    pub fn with_author_id(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }

    /// Returns the active mode.
    #[must_use]
    pub fn mode(&self) -> ExportMode {
        self.mode
    }

    /// Extracts the mode-specific identifier from arbitrary text (a manifest
    /// URL or a completed request URL).
    ///
    /// Returns `None` when the text contains no identifier of the active
    /// mode's shape.
    #[must_use]
    pub fn extract_id(&self, text: &str) -> Option<String> {
        let re: &Regex = match self.mode {
            ExportMode::Ratings => &RATINGS_ID_RE,
            ExportMode::Lists => &LIST_ID_RE,
        };
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Builds the export request URL for an extracted identifier.
    #[must_use]
    pub fn export_url(&self, id: &str) -> String {
        match self.mode {
            ExportMode::Ratings => format!(
                "{}/list/export?list_id=ratings&author_id=ur{id}",
                self.base_url
            ),
            ExportMode::Lists => format!(
                "{}/list/export?list_id=ls{id}&author_id=ur{}",
                self.base_url, self.author_id
            ),
        }
    }
}
