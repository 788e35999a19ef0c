//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use reelvault_core::AppError;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Read size used when streaming a body into a backend.
pub const UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Storage service unreachable: {0}")]
    Unreachable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Errors that no individual transfer can recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StorageError::Unreachable(_) | StorageError::ConfigError(_)
        )
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        if err.is_fatal() {
            AppError::Configuration(err.to_string())
        } else {
            AppError::Transfer(err.to_string())
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Answer to a metadata-only existence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPresence {
    Present,
    Absent,
}

/// Observer for bytes handed to the backend during a single upload.
///
/// Backends call `on_progress` with the cumulative count of bytes the destination has
/// accepted, never decreasing, from the task driving that upload. A backend that sends the
/// object in one request reports once, after it succeeds.
pub trait TransferProgress: Send + Sync {
    fn on_progress(&self, bytes_sent: u64);
}

/// Progress observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn on_progress(&self, _bytes_sent: u64) {}
}

/// Body of an upload, consumed until EOF.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage abstraction trait
///
/// All storage backends (S3-compatible, local filesystem) implement this trait so the
/// ingestion engine can run against any of them, including test doubles.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Metadata-only existence query.
    ///
    /// `Ok(Absent)` means the service confirmed the object is missing; query failures are
    /// returned as errors so callers decide how to treat them.
    async fn head_object(&self, key: &str) -> StorageResult<ObjectPresence>;

    /// Store `body` under `key`, overwriting any existing object.
    ///
    /// Returns the number of bytes stored. `content_length` is the expected size and is
    /// used for logging and buffer sizing only.
    async fn put_object(
        &self,
        key: &str,
        body: ObjectBody,
        content_length: u64,
        content_type: &str,
        progress: &dyn TransferProgress,
    ) -> StorageResult<u64>;

    /// Check that the service is reachable with the configured credentials.
    ///
    /// Fails with `Unreachable` or `ConfigError` when no transfer could succeed.
    async fn probe(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Human-readable location (bucket or directory) for logs.
    fn location(&self) -> String;
}
