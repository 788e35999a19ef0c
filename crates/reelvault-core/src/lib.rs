//! Reelvault Core Library
//!
//! This crate provides the domain model, error types, configuration and content-type
//! classification shared by the storage, ingestion and signing layers.

pub mod config;
pub mod content_type;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod ttl;

// Re-export commonly used types
pub use config::{Config, IngestConfig, SigningConfig, StorageConfig};
pub use content_type::{content_type_for, is_supported_video, SUPPORTED_VIDEO_EXTENSIONS};
pub use error::{AppError, ErrorMetadata, LogLevel, VerificationError};
pub use models::{
    AggregateStats, LocalAsset, SignedCapability, SkipReason, TransferState, UploadOutcome,
};
pub use storage_types::StorageBackend;
pub use ttl::{describe_ttl, parse_ttl};
