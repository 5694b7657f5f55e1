//! Progress UI for download sessions.
//!
//! Consumes the session event stream and renders a progress bar plus one
//! line per status transition. The core never waits on this task; it simply
//! stops when the event channel closes.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use exporter_core::{SessionEvent, StatusIndicator};

/// Spawns the status renderer for a session with `total` entries.
///
/// Returns a handle the caller awaits after the session finishes (the task
/// exits once every event sender is dropped).
pub(crate) fn spawn_status_ui(
    mut events: UnboundedReceiver<SessionEvent>,
    total: usize,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::StatusChanged { label, status, .. } => {
                    bar.println(format!("{} {label}: {status}", glyph(status.indicator())));
                    if status.is_terminal() {
                        bar.inc(1);
                    }
                }
                SessionEvent::StateChanged { state } => {
                    bar.set_message(state.to_string());
                }
                SessionEvent::CorrelationAnomaly { url, reason } => {
                    warn!(%url, %reason, "correlation anomaly");
                    bar.println(format!("! anomaly: {reason}"));
                }
            }
        }

        bar.finish_and_clear();
    })
}

/// Terminal glyph for a status indicator.
fn glyph(indicator: StatusIndicator) -> &'static str {
    match indicator {
        StatusIndicator::Idle => " ",
        StatusIndicator::InProgress => ">",
        StatusIndicator::Success => "+",
        StatusIndicator::Failure => "x",
    }
}
