//! Manifest loading: CSV rows to [`ManifestEntry`] values.
//!
//! The manifest is a comma-delimited CSV with a header row. Column 0 is the
//! label (output filename stem), column 1 the source URL carrying the
//! mode-specific identifier. Splitting is plain comma splitting — the format
//! makes no quoting/escaping guarantees.
//!
//! Rows that cannot become entries (too few columns, blank label, no
//! extractable identifier) are excluded from the result and collected as
//! line-numbered warnings so the caller can surface them; they are never
//! silently mis-dispatched.

mod entry;

pub use entry::{EntryStatus, ManifestEntry, StatusIndicator};

use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, instrument, warn};

use crate::export::ExportTemplate;

/// Errors that can occur while loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// I/O error reading the manifest file.
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The file had no rows at all (not even a header).
    #[error("manifest is empty")]
    Empty,

    /// Every data row was rejected.
    #[error("no valid manifest rows found ({skipped_count} rows rejected)")]
    NoValidRows {
        /// Number of rejected rows.
        skipped_count: usize,
    },
}

/// Result of loading a manifest: accepted entries plus warnings for
/// rejected rows (line number and reason).
#[derive(Debug)]
pub struct ManifestParse {
    /// Entries in manifest order, one per accepted data row.
    pub entries: Vec<ManifestEntry>,
    /// Warnings for rejected rows.
    pub warnings: Vec<(usize, String)>,
}

impl ManifestParse {
    /// Groups entries sharing an extracted identifier.
    ///
    /// Correlation assumes identifiers are unique per session; duplicates are
    /// an anomaly the session reports rather than resolves. Returns
    /// `(identifier, labels)` pairs for each id claimed by more than one row.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<(String, Vec<String>)> {
        let mut by_id: HashMap<&str, Vec<&str>> = HashMap::new();
        for entry in &self.entries {
            by_id.entry(&entry.source_id).or_default().push(&entry.label);
        }
        let mut duplicates: Vec<(String, Vec<String>)> = by_id
            .into_iter()
            .filter(|(_, labels)| labels.len() > 1)
            .map(|(id, labels)| {
                (
                    id.to_string(),
                    labels.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();
        duplicates.sort_by(|a, b| a.0.cmp(&b.0));
        duplicates
    }
}

/// Splits one CSV line on commas. No quoting support.
fn split_csv_line(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

/// Loads a manifest from a buffered reader.
///
/// The first line is the header and is skipped; blank lines are skipped
/// silently. Identifier extraction uses the session's [`ExportTemplate`], so
/// the same row set can yield different entries under different modes.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] on read failure, [`ManifestError::Empty`]
/// for a file without rows, or [`ManifestError::NoValidRows`] when every data
/// row was rejected.
#[instrument(level = "debug", skip(reader, template), fields(mode = %template.mode()))]
pub fn load_manifest(
    reader: impl BufRead,
    template: &ExportTemplate,
) -> Result<ManifestParse, ManifestError> {
    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    let mut saw_header = false;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        let line = line.trim_end();

        if line.is_empty() {
            continue;
        }

        // First non-blank line is the header row.
        if !saw_header {
            saw_header = true;
            continue;
        }

        match parse_row(line, line_number, template) {
            Ok(entry) => {
                debug!(
                    line = line_number,
                    label = %entry.label,
                    id = %entry.source_id,
                    "parsed manifest row"
                );
                entries.push(entry);
            }
            Err(reason) => {
                warn!(line = line_number, %reason, "skipping manifest row");
                warnings.push((line_number, reason));
            }
        }
    }

    if !saw_header {
        return Err(ManifestError::Empty);
    }

    if entries.is_empty() && !warnings.is_empty() {
        return Err(ManifestError::NoValidRows {
            skipped_count: warnings.len(),
        });
    }

    Ok(ManifestParse { entries, warnings })
}

/// Parses a single data row into an entry, or a rejection reason.
fn parse_row(
    line: &str,
    line_number: usize,
    template: &ExportTemplate,
) -> Result<ManifestEntry, String> {
    let columns = split_csv_line(line);
    if columns.len() < 2 {
        return Err(format!(
            "expected at least 2 columns, found {}",
            columns.len()
        ));
    }

    let label = columns[0].trim();
    let url = columns[1].trim();

    if label.is_empty() {
        return Err("label column is empty".to_string());
    }

    let Some(id) = template.extract_id(url) else {
        return Err(format!(
            "no {} identifier found in URL (line {line_number})",
            template.mode()
        ));
    };

    Ok(ManifestEntry::new(label, url, id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::export::ExportMode;
    use std::io::Cursor;

    fn cursor(s: &str) -> Cursor<&[u8]> {
        Cursor::new(s.as_bytes())
    }

    fn ratings_template() -> ExportTemplate {
        ExportTemplate::new(ExportMode::Ratings)
    }

    #[test]
    fn test_load_manifest_valid_rows() {
        let input = "\
List Name,URL
alice,http://www.imdb.com/user/ur1234567/
bob,http://www.imdb.com/user/ur7654321/ratings
";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 2);
        assert!(result.warnings.is_empty());

        assert_eq!(result.entries[0].label, "alice");
        assert_eq!(result.entries[0].source_id, "1234567");
        assert_eq!(result.entries[0].status, EntryStatus::Waiting);
        assert_eq!(result.entries[1].label, "bob");
        assert_eq!(result.entries[1].source_id, "7654321");
    }

    #[test]
    fn test_load_manifest_header_not_treated_as_data() {
        let input = "List Name,URL\nalice,http://www.imdb.com/user/ur1234567/\n";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].label, "alice");
    }

    #[test]
    fn test_load_manifest_skips_blank_lines() {
        let input = "\
List Name,URL

alice,http://www.imdb.com/user/ur1234567/

";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_load_manifest_rejects_short_rows_with_line_numbers() {
        let input = "\
List Name,URL
just-one-column
alice,http://www.imdb.com/user/ur1234567/
";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].0, 2);
        assert!(result.warnings[0].1.contains("at least 2 columns"));
    }

    #[test]
    fn test_load_manifest_rejects_blank_label() {
        let input = "\
List Name,URL
,http://www.imdb.com/user/ur1234567/
";
        let result = load_manifest(cursor(input), &ratings_template());
        assert!(matches!(
            result,
            Err(ManifestError::NoValidRows { skipped_count: 1 })
        ));
    }

    #[test]
    fn test_load_manifest_rejects_row_without_identifier() {
        let input = "\
List Name,URL
alice,http://www.imdb.com/chart/top
bob,http://www.imdb.com/user/ur7654321/
";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].label, "bob");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].1.contains("ratings identifier"));
    }

    #[test]
    fn test_load_manifest_empty_file() {
        let result = load_manifest(cursor(""), &ratings_template());
        assert!(matches!(result, Err(ManifestError::Empty)));
    }

    #[test]
    fn test_load_manifest_header_only_yields_no_entries() {
        let result = load_manifest(cursor("List Name,URL\n"), &ratings_template()).unwrap();
        assert!(result.entries.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_load_manifest_all_rows_rejected() {
        let input = "\
List Name,URL
alice,no-identifier-here
bob,also-nothing
";
        let result = load_manifest(cursor(input), &ratings_template());
        assert!(matches!(
            result,
            Err(ManifestError::NoValidRows { skipped_count: 2 })
        ));
    }

    #[test]
    fn test_load_manifest_crlf_line_endings() {
        let input = "List Name,URL\r\nalice,http://www.imdb.com/user/ur1234567/\r\n";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].source_id, "1234567");
    }

    #[test]
    fn test_load_manifest_list_mode() {
        let input = "\
List Name,URL
watchlist,http://www.imdb.com/list/ls123456789/
";
        let template = ExportTemplate::new(ExportMode::Lists);
        let result = load_manifest(cursor(input), &template).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].source_id, "123456789");
    }

    #[test]
    fn test_load_manifest_trims_label_whitespace() {
        let input = "List Name,URL\n  alice  ,http://www.imdb.com/user/ur1234567/\n";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries[0].label, "alice");
    }

    #[test]
    fn test_duplicate_ids_detected() {
        let input = "\
List Name,URL
alice,http://www.imdb.com/user/ur1234567/
alice-again,http://www.imdb.com/user/ur1234567/lists
bob,http://www.imdb.com/user/ur7654321/
";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        let duplicates = result.duplicate_ids();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, "1234567");
        assert_eq!(duplicates[0].1, vec!["alice", "alice-again"]);
    }

    #[test]
    fn test_duplicate_ids_empty_when_unique() {
        let input = "\
List Name,URL
alice,http://www.imdb.com/user/ur1234567/
bob,http://www.imdb.com/user/ur7654321/
";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert!(result.duplicate_ids().is_empty());
    }

    #[test]
    fn test_extra_columns_are_tolerated() {
        // Only the first two columns matter; trailing columns are ignored.
        let input = "List Name,URL,Notes\nalice,http://www.imdb.com/user/ur1234567/,friend\n";
        let result = load_manifest(cursor(input), &ratings_template()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].label, "alice");
    }
}
