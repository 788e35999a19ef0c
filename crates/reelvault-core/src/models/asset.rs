use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file found on local disk, queued for exactly one transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAsset {
    pub path: PathBuf,
    pub size: u64,
}

impl LocalAsset {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}
