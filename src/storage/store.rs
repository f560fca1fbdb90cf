// LedgerStore - Persistent key-value storage using sled
//
// Key layout:
// - config            -> LedgerConfig
// - account:<address> -> Account
// - event:<seq>       -> EventRecord (seq is a big-endian u64)

use crate::identity::Address;
use crate::ledger::{Account, ChangeSet, EventRecord, Ledger, LedgerConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Key prefixes for organizing data
mod keys {
    pub const CONFIG: &[u8] = b"config";
    pub const ACCOUNT_PREFIX: &[u8] = b"account:";
    pub const EVENT_PREFIX: &[u8] = b"event:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Stored ledger is inconsistent: {0}")]
    Corrupted(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Number of stored accounts
    pub account_count: usize,
    /// Number of stored events
    pub event_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

fn account_key(address: &Address) -> Vec<u8> {
    [keys::ACCOUNT_PREFIX, address.as_bytes().as_slice()].concat()
}

fn event_key(seq: u64) -> Vec<u8> {
    [keys::EVENT_PREFIX, seq.to_be_bytes().as_slice()].concat()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
}

/// Persistent store for the ledger
///
/// Uses sled for crash-safe, embedded storage. Each commit is applied as a
/// single batch, so a crash never leaves half an operation on disk.
pub struct LedgerStore {
    db: sled::Db,
}

impl LedgerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// True once a ledger config has been written
    pub fn is_initialized(&self) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(keys::CONFIG)?)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            account_count: self.db.scan_prefix(keys::ACCOUNT_PREFIX).count(),
            event_count: self.db.scan_prefix(keys::EVENT_PREFIX).count(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    // ========================================================================
    // LEDGER STATE
    // ========================================================================

    /// Load the config record
    pub fn load_config(&self) -> Result<Option<LedgerConfig>, StoreError> {
        match self.get_raw(keys::CONFIG)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load one account record
    pub fn load_account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        match self.get_raw(&account_key(address))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load every account record in address order
    pub fn load_accounts(&self) -> Result<Vec<(Address, Account)>, StoreError> {
        let mut accounts = Vec::new();
        for result in self.db.scan_prefix(keys::ACCOUNT_PREFIX) {
            let (key, value) = result?;
            let address = Address::from_slice(&key[keys::ACCOUNT_PREFIX.len()..])
                .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            accounts.push((address, decode(&value)?));
        }
        Ok(accounts)
    }

    /// Rebuild the ledger, verifying its invariants
    pub fn load_ledger(&self) -> Result<Option<Ledger>, StoreError> {
        let config = match self.load_config()? {
            Some(config) => config,
            None => return Ok(None),
        };
        let accounts = self.load_accounts()?;
        let ledger = Ledger::from_parts(config, accounts)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;
        Ok(Some(ledger))
    }

    /// Persist the keys named in `changes` plus `events` as one atomic batch
    pub fn commit(&self, ledger: &Ledger, changes: &ChangeSet, events: &[EventRecord]) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();

        if changes.config {
            batch.insert(keys::CONFIG, encode(ledger.config())?);
        }
        for address in &changes.accounts {
            batch.insert(account_key(address), encode(&ledger.account(address))?);
        }
        for event in events {
            let seq = self.db.generate_id()?;
            batch.insert(event_key(seq), encode(event)?);
        }

        self.db.apply_batch(batch)?;
        debug!(
            config = changes.config,
            accounts = changes.accounts.len(),
            events = events.len(),
            "committed ledger changes"
        );
        Ok(())
    }

    // ========================================================================
    // EVENT LOG
    // ========================================================================

    /// All stored events in emission order
    pub fn events(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut events = Vec::new();
        for result in self.db.scan_prefix(keys::EVENT_PREFIX) {
            let (_, value) = result?;
            events.push(decode(&value)?);
        }
        Ok(events)
    }

    /// The most recent `limit` events, oldest first
    pub fn recent_events(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError> {
        let mut events = Vec::new();
        for result in self.db.scan_prefix(keys::EVENT_PREFIX).rev().take(limit) {
            let (_, value) = result?;
            events.push(decode(&value)?);
        }
        events.reverse();
        Ok(events)
    }
}
