//! Per-file transfer events.
//!
//! Progress for one file is reported from the task uploading it, so its `bytes_sent`
//! values arrive in order and never decrease. Events from different files interleave
//! freely; consumers that render per-file bars key them by object key.

use reelvault_core::UploadOutcome;
use reelvault_storage::TransferProgress;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Bytes are about to be sent for `key`.
    Started { key: String, total_bytes: u64 },
    /// Cumulative bytes handed to the store so far.
    Progress {
        key: String,
        bytes_sent: u64,
        total_bytes: u64,
    },
    /// Terminal outcome for `key`. Sent exactly once per scanned file.
    Finished { key: String, outcome: UploadOutcome },
}

impl TransferEvent {
    pub fn key(&self) -> &str {
        match self {
            TransferEvent::Started { key, .. }
            | TransferEvent::Progress { key, .. }
            | TransferEvent::Finished { key, .. } => key,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<TransferEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransferEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Adapts storage progress callbacks for one file into [`TransferEvent::Progress`].
pub(crate) struct FileProgress {
    key: String,
    total_bytes: u64,
    sender: Option<EventSender>,
    high_water: AtomicU64,
}

impl FileProgress {
    pub(crate) fn new(key: &str, total_bytes: u64, sender: Option<EventSender>) -> Self {
        Self {
            key: key.to_string(),
            total_bytes,
            sender,
            high_water: AtomicU64::new(0),
        }
    }
}

impl TransferProgress for FileProgress {
    fn on_progress(&self, bytes_sent: u64) {
        let previous = self.high_water.fetch_max(bytes_sent, Ordering::AcqRel);
        if bytes_sent <= previous {
            return;
        }
        if let Some(sender) = &self.sender {
            let _ = sender.send(TransferEvent::Progress {
                key: self.key.clone(),
                bytes_sent,
                total_bytes: self.total_bytes,
            });
        }
    }
}
