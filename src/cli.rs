//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use exporter_core::{DEFAULT_AUTHOR_ID, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS, ExportMode};

/// Batch download IMDb ratings and list exports from a CSV manifest.
///
/// The manifest is a comma-delimited CSV (header row + data rows) whose first
/// column is the output filename stem and second column a URL containing the
/// user (`ur…`) or list (`ls…`) identifier. Each row becomes one export
/// download saved as `{output_dir}/{label}.csv`.
#[derive(Parser, Debug)]
#[command(name = "imdb-exporter")]
#[command(author, version, about)]
pub struct Args {
    /// Manifest CSV path (defaults to the last manifest used)
    pub manifest: Option<PathBuf>,

    /// Directory receiving the exported CSV files (defaults to the last one used)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Cookie file: a single "name=value; name=value" line
    #[arg(long)]
    pub cookies: Option<PathBuf>,

    /// Which export endpoint the manifest rows address
    #[arg(short = 'm', long, value_enum, default_value_t = ModeArg::Ratings)]
    pub mode: ModeArg,

    /// Fixed author id for list-mode export URLs (digits only, no `ur` prefix)
    #[arg(long, default_value = DEFAULT_AUTHOR_ID)]
    pub author_id: String,

    /// Request origin (override for testing against a local server)
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Maximum attempts per entry including the first (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: u8,

    /// Retry failures immediately and forever (the legacy behavior)
    #[arg(long, conflicts_with = "max_retries")]
    pub retry_forever: bool,

    /// Overwrite existing destination files instead of skipping them
    #[arg(long)]
    pub overwrite: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// CLI label for the session-wide download mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Export each row's user ratings.
    Ratings,
    /// Export each row's list.
    Lists,
}

impl From<ModeArg> for ExportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ratings => Self::Ratings,
            ModeArg::Lists => Self::Lists,
        }
    }
}
