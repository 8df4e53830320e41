//! Terminal display logic for the rdap-check CLI.
//!
//! Colored result lines, the batch spinner and the closing summary. Uses only
//! the `console` crate.

use console::{pad_str, style, Alignment, Term};
use rdap_check_lib::{AvailabilityStatus, BatchSummary, CheckResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner, or return `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        let term = Term::stderr();
        if !term.is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Single result line ───────────────────────────────────────────────────────

/// Print one result with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &CheckResult, verbose: bool, counter: Option<(usize, usize)>) {
    let padded_domain = pad_str(&result.domain, 30, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    let label = match result.status {
        AvailabilityStatus::Available => style("AVAILABLE").green().bold(),
        AvailabilityStatus::Registered => style("REGISTERED").red().bold(),
        AvailabilityStatus::Unknown => style("UNKNOWN").yellow(),
    };

    let detail = if verbose || result.status == AvailabilityStatus::Unknown {
        format!("  {}", style(describe(result)).dim())
    } else {
        String::new()
    };

    println!(
        "  {}{}  {}{}",
        prefix,
        style(&padded_domain).white(),
        label,
        detail
    );
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(summary: &BatchSummary, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}  {}  {}",
        style(summary.total).bold(),
        if summary.total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", summary.available)).green(),
        style("|").dim(),
        style(format!("{} registered", summary.registered)).red(),
        style("|").dim(),
        style(format!("{} unknown", summary.unknown)).yellow(),
        style("|").dim(),
        style(summary.status).bold(),
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Short provenance string: HTTP status, RDAP error code, source and timing.
pub fn describe(result: &CheckResult) -> String {
    let mut parts = Vec::new();

    match result.http_status {
        Some(code) => parts.push(format!("HTTP {}", code)),
        None => parts.push("no response".to_string()),
    }
    if let Some(code) = result.error_code {
        if Some(code) != result.http_status {
            parts.push(format!("errorCode {}", code));
        }
    }
    if let Some(source) = &result.source {
        parts.push(format!("via {}", source));
    }
    parts.push(format!("{}ms", result.response_time_ms));

    format!("({})", parts.join(", "))
}

// ── Tests ────────────────────────────────────────────────────────────────────
