use serde::{Deserialize, Serialize};

use super::outcome::UploadOutcome;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Totals for one batch run.
///
/// Owned by the run's single aggregating consumer. `success + skipped + failed` always equals
/// the number of files the run scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub success_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
    pub total_bytes_transferred: u64,
    /// Set when the run stopped early on an external cancellation signal.
    #[serde(default)]
    pub cancelled: bool,
}

impl AggregateStats {
    pub fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Success { bytes_transferred } => {
                self.success_count += 1;
                self.total_bytes_transferred += bytes_transferred;
            }
            UploadOutcome::Skipped { .. } => self.skipped_count += 1,
            UploadOutcome::Failed { .. } => self.failed_count += 1,
        }
    }

    /// Number of files accounted for.
    pub fn total(&self) -> u64 {
        self.success_count + self.skipped_count + self.failed_count
    }

    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes_transferred as f64 / BYTES_PER_MEGABYTE
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }
}
