//! Domain models for ingestion and signed access.

pub mod asset;
pub mod capability;
pub mod outcome;
pub mod stats;

pub use asset::LocalAsset;
pub use capability::SignedCapability;
pub use outcome::{SkipReason, TransferState, UploadOutcome};
pub use stats::AggregateStats;
