use crate::traits::{
    ObjectBody, ObjectPresence, Storage, StorageError, StorageResult, TransferProgress,
    UPLOAD_CHUNK_SIZE,
};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Local filesystem storage implementation
///
/// Objects are plain files under `base_path`, one per key. Writes land in a hidden sibling
/// file and are renamed into place, so an interrupted upload never looks like a stored object.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/reelvault/objects")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert an object key to a filesystem path with security validation
    ///
    /// Rejects keys that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let has_parent_component = Path::new(storage_key)
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if storage_key.is_empty()
            || has_parent_component
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains invalid characters: {}",
                storage_key
            )));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Hidden sibling used while an upload is in flight.
    fn partial_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.partial", name))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Removes an in-flight `.partial` file unless the upload completed.
///
/// Also runs when the upload future is dropped mid-transfer.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial upload");
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn head_object(&self, key: &str) -> StorageResult<ObjectPresence> {
        let path = self.key_to_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(ObjectPresence::Present),
            Ok(_) => Ok(ObjectPresence::Absent),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ObjectPresence::Absent),
            Err(e) => Err(StorageError::BackendError(format!(
                "Failed to stat {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        mut body: ObjectBody,
        content_length: u64,
        content_type: &str,
        progress: &dyn TransferProgress,
    ) -> StorageResult<u64> {
        let path = self.key_to_path(key)?;
        let partial = Self::partial_path(&path);
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut guard = PartialFile::new(partial.clone());
        let mut file = fs::File::create(&partial).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                partial.display(),
                e
            ))
        })?;

        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        let mut sent: u64 = 0;
        loop {
            let read = body.read(&mut buf).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read upload body: {}", e))
            })?;
            if read == 0 {
                break;
            }
            file.write_all(&buf[..read]).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    partial.display(),
                    e
                ))
            })?;
            sent += read as u64;
            progress.on_progress(sent);
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                partial.display(),
                e
            ))
        })?;
        drop(file);

        fs::rename(&partial, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to move {} into place: {}",
                path.display(),
                e
            ))
        })?;
        guard.commit();

        tracing::info!(
            path = %path.display(),
            key = %key,
            content_type = %content_type,
            expected_bytes = content_length,
            size_bytes = sent,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(sent)
    }

    async fn probe(&self) -> StorageResult<()> {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::Unreachable(format!(
                "{} is not a directory",
                self.base_path.display()
            ))),
            Err(e) => Err(StorageError::Unreachable(format!(
                "{}: {}",
                self.base_path.display(),
                e
            ))),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    fn location(&self) -> String {
        self.base_path.display().to_string()
    }
}
