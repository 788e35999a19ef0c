//! Batch transfer engine.
//!
//! A run scans a local tree on a blocking thread, hands each asset to a bounded pool of
//! upload workers, and funnels every outcome through one aggregating task. The aggregate
//! is owned by that task alone, so there is no shared mutable counter.

use super::oracle::ExistenceOracle;
use super::progress::{EventSender, FileProgress, TransferEvent};
use super::scanner::{scan, AssetScanner};
use reelvault_core::{
    content_type_for, AggregateStats, AppError, IngestConfig, LocalAsset, SkipReason,
    TransferState, UploadOutcome,
};
use reelvault_storage::{normalize_prefix, object_key, ObjectBody, Storage, StorageError};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Runs single-file and batch uploads against one storage backend.
#[derive(Clone)]
pub struct TransferEngine {
    storage: Arc<dyn Storage>,
    oracle: ExistenceOracle,
    max_concurrent: usize,
    events: Option<EventSender>,
}

impl TransferEngine {
    pub fn new(storage: Arc<dyn Storage>, config: &IngestConfig) -> Self {
        Self {
            oracle: ExistenceOracle::new(storage.clone()),
            storage,
            max_concurrent: config.max_concurrent.max(1),
            events: None,
        }
    }

    /// Report [`TransferEvent`]s for every file to `sender`.
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Enumerate the uploadable files under `root` without transferring anything.
    pub fn scan(&self, root: &Path) -> AssetScanner {
        scan(root)
    }

    /// Transfer one asset to `key`. Never fails: every error becomes
    /// [`UploadOutcome::Failed`].
    pub async fn upload_one(
        &self,
        asset: &LocalAsset,
        key: &str,
        skip_existing: bool,
    ) -> UploadOutcome {
        self.transfer(asset, key, skip_existing)
            .await
            .unwrap_or_else(UploadOutcome::failed)
    }

    /// Single-file transfer. `Err` carries storage errors no other transfer could
    /// survive ([`StorageError::is_fatal`]); the file is already reported as failed.
    async fn transfer(
        &self,
        asset: &LocalAsset,
        key: &str,
        skip_existing: bool,
    ) -> Result<UploadOutcome, StorageError> {
        let mut state = TransferState::Pending;

        advance(key, &mut state, TransferState::Checking);
        if skip_existing && self.oracle.exists(key).await {
            advance(key, &mut state, TransferState::Skipped);
            tracing::info!(key = %key, "Object already exists, skipping");
            let outcome = UploadOutcome::Skipped {
                reason: SkipReason::AlreadyExists,
            };
            self.emit_finished(key, &outcome);
            return Ok(outcome);
        }

        advance(key, &mut state, TransferState::Uploading);
        let file = match tokio::fs::File::open(&asset.path).await {
            Ok(file) => file,
            Err(e) => {
                advance(key, &mut state, TransferState::Failed);
                tracing::warn!(
                    path = %asset.path.display(),
                    key = %key,
                    error = %e,
                    "Failed to open file for upload"
                );
                let outcome =
                    UploadOutcome::failed(format!("Failed to open {}: {}", asset.path.display(), e));
                self.emit_finished(key, &outcome);
                return Ok(outcome);
            }
        };

        self.emit(TransferEvent::Started {
            key: key.to_string(),
            total_bytes: asset.size,
        });

        let start = Instant::now();
        let progress = FileProgress::new(key, asset.size, self.events.clone());
        let content_type = content_type_for(&asset.path);
        let body: ObjectBody = Box::pin(file);

        match self
            .storage
            .put_object(key, body, asset.size, content_type, &progress)
            .await
        {
            Ok(bytes_transferred) => {
                advance(key, &mut state, TransferState::Done);
                tracing::info!(
                    key = %key,
                    size_bytes = bytes_transferred,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Uploaded"
                );
                let outcome = UploadOutcome::Success { bytes_transferred };
                self.emit_finished(key, &outcome);
                Ok(outcome)
            }
            Err(e) => {
                advance(key, &mut state, TransferState::Failed);
                self.emit_finished(key, &UploadOutcome::failed(&e));
                if e.is_fatal() {
                    tracing::error!(key = %key, error = %e, "Storage failed fatally");
                    return Err(e);
                }
                tracing::warn!(key = %key, error = %e, "Upload failed");
                Ok(UploadOutcome::failed(e))
            }
        }
    }

    /// Upload exactly one named file, without an existence check.
    ///
    /// A missing or non-file `local_path` is an error rather than a failed outcome.
    pub async fn upload_single(
        &self,
        local_path: &Path,
        key: &str,
    ) -> Result<UploadOutcome, AppError> {
        if key.is_empty() {
            return Err(AppError::InvalidInput("Object key cannot be empty".to_string()));
        }

        let meta = tokio::fs::metadata(local_path).await.map_err(|_| {
            AppError::NotFound(format!("File does not exist: {}", local_path.display()))
        })?;
        if !meta.is_file() {
            return Err(AppError::NotFound(format!(
                "Not a regular file: {}",
                local_path.display()
            )));
        }

        let asset = LocalAsset::new(local_path, meta.len());
        self.transfer(&asset, key, false)
            .await
            .map_err(AppError::from)
    }

    /// Upload every supported file under `root` to `prefix + relative_path`.
    pub async fn run_batch(
        &self,
        root: &Path,
        prefix: &str,
        skip_existing: bool,
    ) -> Result<AggregateStats, AppError> {
        self.run_batch_with_cancel(root, prefix, skip_existing, &CancellationToken::new())
            .await
    }

    /// [`TransferEngine::run_batch`] that stops early once `cancel` fires.
    ///
    /// After cancellation no new transfers start and in-flight transfers are aborted and
    /// recorded as failed. Files the run never took from the scan are not counted.
    ///
    /// A fatal storage error on any file (unreachable service, rejected credentials)
    /// stops the run the same way and is returned as [`AppError::Configuration`].
    #[tracing::instrument(skip_all, fields(root = %root.display(), prefix = %prefix))]
    pub async fn run_batch_with_cancel(
        &self,
        root: &Path,
        prefix: &str,
        skip_existing: bool,
        cancel: &CancellationToken,
    ) -> Result<AggregateStats, AppError> {
        let meta = tokio::fs::metadata(root).await.map_err(|_| {
            AppError::NotFound(format!("Directory does not exist: {}", root.display()))
        })?;
        if !meta.is_dir() {
            return Err(AppError::InvalidInput(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        self.storage.probe().await.map_err(|e| {
            AppError::Configuration(format!(
                "Cannot reach storage at {}: {}",
                self.storage.location(),
                e
            ))
        })?;

        let prefix = normalize_prefix(prefix);
        let start = Instant::now();

        tracing::info!(
            max_concurrent = self.max_concurrent,
            skip_existing,
            destination = %self.storage.location(),
            "Batch upload started"
        );

        let (asset_tx, mut asset_rx) = mpsc::channel::<LocalAsset>(self.max_concurrent * 2);
        let scan_root = root.to_path_buf();
        let scanner = tokio::task::spawn_blocking(move || {
            for asset in scan(&scan_root) {
                if asset_tx.blocking_send(asset).is_err() {
                    break;
                }
            }
        });

        let (outcome_tx, mut outcome_rx) = mpsc::channel::<UploadOutcome>(self.max_concurrent * 4);
        let aggregator = tokio::spawn(async move {
            let mut stats = AggregateStats::default();
            while let Some(outcome) = outcome_rx.recv().await {
                stats.record(&outcome);
            }
            stats
        });

        // Fires on external cancellation or on the first fatal storage error.
        let abort = cancel.child_token();
        let fatal: Arc<Mutex<Option<StorageError>>> = Arc::new(Mutex::new(None));

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut workers = JoinSet::new();
        let mut dispatched: u64 = 0;

        loop {
            let permit = tokio::select! {
                biased;
                _ = abort.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|e| AppError::Internal(format!("Worker pool closed: {}", e)))?,
            };

            let asset = tokio::select! {
                biased;
                _ = abort.cancelled() => break,
                next = asset_rx.recv() => match next {
                    Some(asset) => asset,
                    None => break,
                },
            };

            dispatched += 1;
            let key = object_key(root, &asset.path, &prefix);
            let engine = self.clone();
            let tx = outcome_tx.clone();
            let abort = abort.clone();
            let fatal = fatal.clone();

            workers.spawn(async move {
                let _permit = permit;
                let outcome = tokio::select! {
                    biased;
                    _ = abort.cancelled() => {
                        tracing::warn!(key = %key, "Transfer aborted");
                        let outcome = UploadOutcome::failed("Transfer cancelled");
                        engine.emit_finished(&key, &outcome);
                        outcome
                    }
                    result = engine.transfer(&asset, &key, skip_existing) => match result {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let outcome = UploadOutcome::failed(&e);
                            if let Ok(mut first) = fatal.lock() {
                                first.get_or_insert(e);
                            }
                            abort.cancel();
                            outcome
                        }
                    },
                };
                let _ = tx.send(outcome).await;
            });
        }

        // Stop the scanner if the loop ended early.
        drop(asset_rx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Upload worker terminated abnormally");
                let _ = outcome_tx
                    .send(UploadOutcome::failed(format!("Upload worker failed: {}", e)))
                    .await;
            }
        }
        drop(outcome_tx);

        if let Err(e) = scanner.await {
            tracing::error!(error = %e, "Directory scan terminated abnormally");
        }

        let mut stats = aggregator
            .await
            .map_err(|e| AppError::Internal(format!("Aggregator failed: {}", e)))?;
        stats.cancelled = cancel.is_cancelled();

        debug_assert_eq!(stats.total(), dispatched);

        let fatal = fatal.lock().ok().and_then(|mut first| first.take());
        if let Some(e) = fatal {
            tracing::error!(
                error = %e,
                files = dispatched,
                success = stats.success_count,
                failed = stats.failed_count,
                "Batch upload aborted"
            );
            return Err(AppError::from(e));
        }

        if dispatched == 0 && !stats.cancelled {
            tracing::warn!(root = %root.display(), "No video files found");
        }

        tracing::info!(
            files = dispatched,
            success = stats.success_count,
            skipped = stats.skipped_count,
            failed = stats.failed_count,
            size_bytes = stats.total_bytes_transferred,
            cancelled = stats.cancelled,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Batch upload finished"
        );

        Ok(stats)
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    fn emit_finished(&self, key: &str, outcome: &UploadOutcome) {
        self.emit(TransferEvent::Finished {
            key: key.to_string(),
            outcome: outcome.clone(),
        });
    }
}

fn advance(key: &str, state: &mut TransferState, next: TransferState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid transfer state change {:?} -> {:?}",
        state,
        next
    );
    tracing::debug!(key = %key, from = ?state, to = ?next, "Transfer state change");
    *state = next;
}
