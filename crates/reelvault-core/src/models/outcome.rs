use serde::{Deserialize, Serialize};

/// Why a transfer was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyExists,
}

/// Result of a single file transfer. Every scanned file produces exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Success { bytes_transferred: u64 },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl UploadOutcome {
    pub fn failed(error: impl ToString) -> Self {
        UploadOutcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, UploadOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UploadOutcome::Failed { .. })
    }

    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> TransferState {
        match self {
            UploadOutcome::Success { .. } => TransferState::Done,
            UploadOutcome::Skipped { .. } => TransferState::Skipped,
            UploadOutcome::Failed { .. } => TransferState::Failed,
        }
    }
}

/// Lifecycle of one file within a batch run.
///
/// `Pending -> Checking -> {Skipped | Uploading -> {Done | Failed}}`. Every file passes
/// through `Checking`; with skip-existing off the check itself is a no-op. A failed
/// existence check falls through to `Uploading`, and so does a file that later turns out
/// to be unreadable, which then fails from `Uploading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Pending,
    Checking,
    Skipped,
    Uploading,
    Done,
    Failed,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Skipped | TransferState::Done | TransferState::Failed
        )
    }

    pub fn can_transition_to(self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Pending, Checking)
                | (Checking, Skipped)
                | (Checking, Uploading)
                | (Uploading, Done)
                | (Uploading, Failed)
        )
    }
}
