//! CLI entry point for the IMDb exporter.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use exporter_core::{
    CookieSet, DownloadSession, ExportTemplate, HttpFetcher, RetryPolicy, SessionConfig, Settings,
    StatusReporter, default_settings_path, load_manifest, parse_cookie_header,
};
use tracing::{debug, info, warn};

mod cli;
mod ui;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("IMDb exporter starting");

    // Last-used paths serve as defaults for omitted arguments.
    let settings_path = default_settings_path();
    let mut settings = match &settings_path {
        Some(path) => Settings::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable settings file");
            Settings::default()
        }),
        None => Settings::default(),
    };

    let manifest_path = match args.manifest.clone().or(settings.last_manifest.clone()) {
        Some(path) => path,
        None => bail!("no manifest path given and none remembered from a previous run"),
    };
    let output_dir = match args.output_dir.clone().or(settings.last_output_dir.clone()) {
        Some(dir) => dir,
        None => bail!("no output directory given (-o) and none remembered from a previous run"),
    };

    // Cookies are only applied when explicitly requested; a malformed cookie
    // file is a configuration error, never partially applied.
    let cookies = match &args.cookies {
        Some(path) => load_cookie_file(path)?,
        None => CookieSet::empty(),
    };
    if cookies.is_empty() {
        debug!("no cookies loaded; requests go out unauthenticated");
    } else {
        info!(count = cookies.len(), "loaded cookies");
    }

    let template = ExportTemplate::new(args.mode.into())
        .with_base_url(args.base_url.clone())
        .with_author_id(args.author_id.clone());

    let manifest_file = File::open(&manifest_path)
        .with_context(|| format!("failed to open manifest {}", manifest_path.display()))?;
    let parse = load_manifest(BufReader::new(manifest_file), &template)
        .with_context(|| format!("failed to load manifest {}", manifest_path.display()))?;

    info!(
        entries = parse.entries.len(),
        rejected = parse.warnings.len(),
        mode = %template.mode(),
        "manifest loaded"
    );

    // Selections succeeded; remember them for next time.
    settings.last_manifest = Some(manifest_path);
    settings.last_output_dir = Some(output_dir.clone());
    if let Some(path) = &args.cookies {
        settings.last_cookies = Some(path.clone());
    }
    if let Some(path) = &settings_path
        && let Err(e) = settings.save(path)
    {
        warn!(error = %e, "failed to persist settings");
    }

    let retry_policy = if args.retry_forever {
        warn!("retrying failures forever with no backoff; interrupt to stop");
        RetryPolicy::unbounded()
    } else {
        RetryPolicy::with_max_attempts(u32::from(args.max_retries))
    };

    let config = SessionConfig {
        concurrency: usize::from(args.concurrency),
        overwrite: args.overwrite,
        output_dir,
        retry_policy,
    };

    let (reporter, ui_handle) = if args.quiet {
        (StatusReporter::disabled(), None)
    } else {
        let (reporter, events) = StatusReporter::channel();
        let handle = ui::spawn_status_ui(events, parse.entries.len());
        (reporter, Some(handle))
    };

    let total = parse.entries.len();
    let mut session = DownloadSession::new(parse.entries, template, config, reporter)?;
    let fetcher = Arc::new(HttpFetcher::new(&cookies));

    let stats = session.run(fetcher).await?;

    // Dropping the session closes the event channel and lets the renderer
    // drain and exit.
    drop(session);
    if let Some(handle) = ui_handle {
        let _ = handle.await;
    }

    info!(
        saved = stats.saved(),
        skipped = stats.skipped(),
        failed = stats.failed(),
        retried = stats.retried(),
        anomalies = stats.anomalies(),
        total,
        "export complete"
    );

    if stats.failed() > 0 {
        warn!(failed = stats.failed(), "some entries were not exported");
    }

    Ok(())
}

/// Reads and parses a cookie file.
fn load_cookie_file(path: &PathBuf) -> Result<CookieSet> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cookie file {}", path.display()))?;
    let cookies = parse_cookie_header(&contents)
        .with_context(|| format!("invalid cookie file {}", path.display()))?;
    Ok(cookies)
}
