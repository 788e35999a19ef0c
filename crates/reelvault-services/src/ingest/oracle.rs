//! Existence checks against the remote store.

use reelvault_storage::{ObjectPresence, Storage, StorageResult};
use std::sync::Arc;

/// Answers "is this key already stored?" for the skip-existing policy.
///
/// [`ExistenceOracle::query`] keeps the three cases apart (present, confirmed absent,
/// query error). [`ExistenceOracle::exists`] applies the ingestion policy: a query error
/// counts as absent, so the file is uploaded again. Re-uploading identical content costs
/// bandwidth; skipping on a false positive would lose data.
#[derive(Clone)]
pub struct ExistenceOracle {
    storage: Arc<dyn Storage>,
}

impl ExistenceOracle {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn query(&self, key: &str) -> StorageResult<ObjectPresence> {
        self.storage.head_object(key).await
    }

    /// `true` only when the store confirmed the object is present.
    pub async fn exists(&self, key: &str) -> bool {
        match self.query(key).await {
            Ok(ObjectPresence::Present) => true,
            Ok(ObjectPresence::Absent) => false,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Existence check failed, treating object as absent"
                );
                false
            }
        }
    }
}
