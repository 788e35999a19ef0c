//! Reelvault Storage Library
//!
//! This crate provides the storage abstraction consumed by the ingestion engine and its
//! implementations for S3-compatible object stores and the local filesystem.
//!
//! # Object key format
//!
//! Keys use `/` as the only separator and are formed as `prefix + relative_path`, where the
//! prefix is either empty or ends with exactly one `/`. Keys must not contain `..` or a
//! leading `/`. Key construction lives in the `keys` module so every caller agrees.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{normalize_prefix, object_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reelvault_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{
    NoProgress, ObjectBody, ObjectPresence, Storage, StorageError, StorageResult,
    TransferProgress, UPLOAD_CHUNK_SIZE,
};
