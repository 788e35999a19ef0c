use chrono::{DateTime, Utc};
use reelvault_core::{describe_ttl, AggregateStats, UploadOutcome};
use reelvault_services::TransferEvent;
use serde::Serialize;
use std::collections::HashMap;

/// Percent step between progress lines for one file.
const PROGRESS_STEP: u64 = 10;

/// Initialize tracing for the CLI. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// One line per finished file.
pub fn format_outcome(key: &str, outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Success { bytes_transferred } => {
            format!("uploaded  {} ({})", key, format_size(*bytes_transferred))
        }
        UploadOutcome::Skipped { .. } => format!("skipped   {} (already exists)", key),
        UploadOutcome::Failed { error } => format!("failed    {}: {}", key, error),
    }
}

/// Turns the engine's event stream into console lines.
///
/// Progress is throttled to one line per [`PROGRESS_STEP`] percent of each file; the
/// final step is left to the finished line.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_step: HashMap<String, u64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line to print for `event`, if any.
    pub fn observe(&mut self, event: &TransferEvent) -> Option<String> {
        match event {
            TransferEvent::Started { key, total_bytes } => {
                self.last_step.insert(key.clone(), 0);
                Some(format!("starting  {} ({})", key, format_size(*total_bytes)))
            }
            TransferEvent::Progress {
                key,
                bytes_sent,
                total_bytes,
            } => {
                if *total_bytes == 0 {
                    return None;
                }
                let percent = bytes_sent.saturating_mul(100) / total_bytes;
                let step = percent / PROGRESS_STEP * PROGRESS_STEP;
                let last = self.last_step.entry(key.clone()).or_insert(0);
                if step <= *last || step >= 100 {
                    return None;
                }
                *last = step;
                Some(format!(
                    "progress  {} {:>3}% ({} / {})",
                    key,
                    step,
                    format_size(*bytes_sent),
                    format_size(*total_bytes)
                ))
            }
            TransferEvent::Finished { key, outcome } => {
                self.last_step.remove(key);
                Some(format_outcome(key, outcome))
            }
        }
    }

    /// Files started but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.last_step.len()
    }
}

/// Summary table printed after a batch.
pub fn format_summary(stats: &AggregateStats) -> String {
    let mut out = String::new();
    out.push_str("Upload summary\n");
    out.push_str(&format!("  Success:  {}\n", stats.success_count));
    out.push_str(&format!("  Skipped:  {}\n", stats.skipped_count));
    out.push_str(&format!("  Failed:   {}\n", stats.failed_count));
    out.push_str(&format!("  Total:    {:.2} MB", stats.total_megabytes()));
    if stats.cancelled {
        out.push_str("\n  (cancelled before completion)");
    }
    out
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[derive(Debug, Serialize)]
pub struct LinkReport {
    pub url: String,
    pub resource_path: String,
    pub expires_at: u64,
    pub expires_at_utc: Option<String>,
    pub valid_for: String,
}

impl LinkReport {
    pub fn new(url: String, resource_path: &str, expires_at: u64, ttl_secs: u64) -> Self {
        Self {
            url,
            resource_path: resource_path.to_string(),
            expires_at,
            expires_at_utc: format_timestamp(expires_at),
            valid_for: describe_ttl(ttl_secs),
        }
    }
}

/// RFC 3339 rendering of a Unix timestamp, if representable.
pub fn format_timestamp(unix_secs: u64) -> Option<String> {
    let secs = i64::try_from(unix_secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
}
