// Storage module - PERSISTENCE
// Handles persistent key-value storage of ledger state using sled

mod store;

pub use store::{LedgerStore, StorageStats, StoreError};
