//! Bulk ingestion: scan a local tree, skip what the store already has, upload the rest.

pub mod engine;
pub mod oracle;
pub mod progress;
pub mod scanner;

pub use engine::TransferEngine;
pub use oracle::ExistenceOracle;
pub use progress::{event_channel, EventReceiver, EventSender, TransferEvent};
pub use scanner::{scan, AssetScanner};
