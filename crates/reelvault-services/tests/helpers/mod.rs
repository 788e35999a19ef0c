//! Shared helpers for the ingestion and signing integration tests.
//!
//! Run from workspace root: `cargo test -p reelvault-services`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use reelvault_core::IngestConfig;
use reelvault_services::TransferEngine;
use std::sync::Arc;

pub use storage::MemoryStorage;

/// Engine over a fresh in-memory store with the given worker count.
pub fn engine_with(storage: Arc<MemoryStorage>, max_concurrent: usize) -> TransferEngine {
    let config = IngestConfig {
        max_concurrent,
        ..IngestConfig::default()
    };
    TransferEngine::new(storage, &config)
}
