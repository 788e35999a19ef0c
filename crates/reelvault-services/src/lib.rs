//! Reelvault Services Layer
//!
//! Hosts the two orchestration services built on top of the storage abstraction:
//! bulk ingestion of a local media tree (`ingest`) and issuance of signed, expiring
//! access URLs (`signing`). Storage types are re-exported so callers depend on a single
//! facade.

pub mod ingest;
pub mod signing;

pub use ingest::{
    event_channel, scan, AssetScanner, EventReceiver, EventSender, ExistenceOracle,
    TransferEngine, TransferEvent,
};
pub use reelvault_storage::{
    create_storage, normalize_prefix, object_key, ObjectPresence, Storage, StorageBackend,
    StorageError, StorageResult,
};
pub use signing::{
    issue, sign, verify, verify_url, Clock, SystemClock, TokenIssuer, TokenVerifier,
};
