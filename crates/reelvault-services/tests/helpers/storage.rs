//! In-memory storage double with failure injection.

use async_trait::async_trait;
use reelvault_storage::{
    ObjectBody, ObjectPresence, Storage, StorageBackend, StorageError, StorageResult,
    TransferProgress,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    failing_keys: Mutex<HashSet<String>>,
    put_delay: Mutex<Option<Duration>>,
    head_fails: AtomicBool,
    unreachable: AtomicBool,
    puts_unreachable: AtomicBool,
    put_calls: AtomicUsize,
    active_puts: AtomicUsize,
    max_active_puts: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an object as if an earlier run stored it.
    pub fn seed(&self, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn fail_puts_for(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_heads(&self) {
        self.head_fails.store(true, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    /// Every PUT fails as if the service went away after the run started.
    pub fn drop_connection_on_puts(&self) {
        self.puts_unreachable.store(true, Ordering::SeqCst);
    }

    pub fn delay_puts(&self, delay: Duration) {
        *self.put_delay.lock().unwrap() = Some(delay);
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn max_active_puts(&self) -> usize {
        self.max_active_puts.load(Ordering::SeqCst)
    }
}

/// Decrements the active-put gauge even when the upload future is dropped.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn head_object(&self, key: &str) -> StorageResult<ObjectPresence> {
        if self.head_fails.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("injected HEAD failure".to_string()));
        }
        if self.objects.lock().unwrap().contains_key(key) {
            Ok(ObjectPresence::Present)
        } else {
            Ok(ObjectPresence::Absent)
        }
    }

    async fn put_object(
        &self,
        key: &str,
        mut body: ObjectBody,
        _content_length: u64,
        content_type: &str,
        progress: &dyn TransferProgress,
    ) -> StorageResult<u64> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_puts.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active_puts);
        self.max_active_puts.fetch_max(active, Ordering::SeqCst);

        let delay = *self.put_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.puts_unreachable.load(Ordering::SeqCst) {
            return Err(StorageError::Unreachable(format!(
                "connection refused while storing {}",
                key
            )));
        }

        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(StorageError::UploadFailed(format!(
                "injected PUT failure for {}",
                key
            )));
        }

        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        progress.on_progress(data.len() as u64);

        let size = data.len() as u64;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(size)
    }

    async fn probe(&self) -> StorageResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StorageError::Unreachable("injected outage".to_string()));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    fn location(&self) -> String {
        "memory://test-bucket".to_string()
    }
}
