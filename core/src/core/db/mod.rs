//! Database layer for the share store.
//!
//! This module handles all redb operations:
//! - Entry rows (EntryId → VersionedEntry)
//! - The expiry index used by the sweep
//! - Retired blobs awaiting their deletion deadline
//! - Maintenance metadata (JSON strings)

use crate::core::db::error::DatabaseError;
use crate::core::db::expiry_index::ExpiryIndex;
use crate::types::metadata::MaintenanceMetadata;
use crate::types::value::versioned_value::VersionedEntry;
use crate::types::value::versioned_value::latest_value::Entry;
use crate::types::{Config, EntryId, ExpiryKey, StorageKey};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::HashSet;
use std::time::SystemTime;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DatabaseError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        TableError(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        StorageError(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        TransactionError(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        CommitError(#[from] redb::CommitError),

        #[error("Metadata encoding error: {0}")]
        Metadata(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Entry not found")]
        NotFound,

        #[error("Entry already exists")]
        AlreadyExists,

        #[error("Entry has no file")]
        NoFile,
    }
}

mod expiry_index;

/// Main table: EntryId → VersionedEntry
const ENTRIES_TABLE: TableDefinition<EntryId, VersionedEntry> = TableDefinition::new("entries");

/// Retired blobs: StorageKey → deletion deadline (milliseconds since epoch).
const RETIRED_BLOBS_TABLE: TableDefinition<StorageKey, u64> =
    TableDefinition::new("retired_blobs");

/// Metadata table: &str → JSON string
const METADATA_TABLE: TableDefinition<&str, &str> = TableDefinition::new("metadata");

const METADATA_KEY_MAINTENANCE: &str = "maintenance";

const EXPIRY_INDEX: ExpiryIndex = ExpiryIndex::new("expiry_index");

fn epoch_millis(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0)
}

pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Creates or opens the database at the config's `db_path`.
    pub fn new(config: &Config) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&config.base_path)?;

        let db = redb::Database::create(config.db_path())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ENTRIES_TABLE)?;
            let _ = write_txn.open_table(RETIRED_BLOBS_TABLE)?;
            let _ = write_txn.open_table(METADATA_TABLE)?;
            EXPIRY_INDEX.init(&write_txn)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

/// Create operations.
impl Database {
    /// Inserts a new row and its expiry index key in one transaction.
    ///
    /// Returns `Err(AlreadyExists)` if the id is taken.
    pub fn insert(&self, id: &EntryId, entry: &Entry) -> Result<(), DatabaseError> {
        let write_txn = self.db.begin_write()?;

        {
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;

            if entries.get(id)?.is_some() {
                return Err(DatabaseError::AlreadyExists);
            }

            EXPIRY_INDEX.insert(&write_txn, &Self::expiry_key(id, entry))?;
            entries.insert(id, &VersionedEntry::from(entry.clone()))?;
        }

        write_txn.commit()?;
        Ok(())
    }
}

/// Read operations.
impl Database {
    pub fn contains(&self, id: &EntryId) -> Result<bool, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        Ok(table.get(id)?.is_some())
    }

    pub fn get(&self, id: &EntryId) -> Result<Option<Entry>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        Ok(table.get(id)?.map(|guard| guard.value().into_latest()))
    }

    /// Ids whose `expires_at <= now`, oldest first.
    pub fn expired_ids(&self, now: SystemTime) -> Result<Vec<EntryId>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        EXPIRY_INDEX.expired_ids(&read_txn, now)
    }

    /// Storage keys still owned by a row or waiting in the retired table.
    pub fn referenced_blobs(&self) -> Result<HashSet<StorageKey>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let mut keys = HashSet::new();

        let entries = read_txn.open_table(ENTRIES_TABLE)?;
        for item in entries.iter()? {
            let (_, guard) = item?;
            if let Some(file) = guard.value().into_latest().file {
                keys.insert(file.storage_key);
            }
        }

        let retired = read_txn.open_table(RETIRED_BLOBS_TABLE)?;
        for item in retired.iter()? {
            let (key_guard, _) = item?;
            keys.insert(key_guard.value());
        }

        Ok(keys)
    }

    /// Retired blobs whose deadline is at or before `now`.
    pub fn due_retired_blobs(&self, now: SystemTime) -> Result<Vec<StorageKey>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RETIRED_BLOBS_TABLE)?;
        let now_ms = epoch_millis(now);

        let mut due = Vec::new();
        for item in table.iter()? {
            let (key_guard, deadline_guard) = item?;
            if deadline_guard.value() <= now_ms {
                due.push(key_guard.value());
            }
        }

        Ok(due)
    }
}

/// Delete operations.
impl Database {
    /// Removes a row and its index key.
    ///
    /// Returns `Err(NotFound)` if the id doesn't exist.
    pub fn remove(&self, id: &EntryId) -> Result<Entry, DatabaseError> {
        let write_txn = self.db.begin_write()?;

        let entry = {
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;

            let entry = entries
                .remove(id)?
                .map(|guard| guard.value().into_latest())
                .ok_or(DatabaseError::NotFound)?;

            EXPIRY_INDEX.remove(&write_txn, &Self::expiry_key(id, &entry))?;
            entry
        };

        write_txn.commit()?;
        Ok(entry)
    }

    /// Removes a row only if it is still present and expired at `now`.
    ///
    /// Returns `Ok(None)` when a concurrent delete got there first.
    pub fn remove_if_expired(
        &self,
        id: &EntryId,
        now: SystemTime,
    ) -> Result<Option<Entry>, DatabaseError> {
        let write_txn = self.db.begin_write()?;

        let removed = {
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;

            let current = entries.get(id)?.map(|guard| guard.value().into_latest());

            match current {
                Some(entry) if now >= entry.expires_at => {
                    entries.remove(id)?;
                    EXPIRY_INDEX.remove(&write_txn, &Self::expiry_key(id, &entry))?;
                    Some(entry)
                }
                _ => None,
            }
        };

        write_txn.commit()?;
        Ok(removed)
    }

    /// Removes a file-bearing row and hands its blob to the retired table
    /// with the given deletion deadline.
    ///
    /// Returns `Err(NotFound)` if the id doesn't exist and `Err(NoFile)` if
    /// the entry has no file (the row is left untouched).
    pub fn retire(&self, id: &EntryId, deadline: SystemTime) -> Result<Entry, DatabaseError> {
        let write_txn = self.db.begin_write()?;

        let entry = {
            let mut entries = write_txn.open_table(ENTRIES_TABLE)?;

            let entry = entries
                .get(id)?
                .map(|guard| guard.value().into_latest())
                .ok_or(DatabaseError::NotFound)?;

            let Some(file) = &entry.file else {
                return Err(DatabaseError::NoFile);
            };

            let mut retired = write_txn.open_table(RETIRED_BLOBS_TABLE)?;
            retired.insert(file.storage_key, epoch_millis(deadline))?;

            entries.remove(id)?;
            EXPIRY_INDEX.remove(&write_txn, &Self::expiry_key(id, &entry))?;
            entry
        };

        write_txn.commit()?;
        Ok(entry)
    }

    /// Drops a retired blob record. Returns `true` if it was present.
    pub fn forget_retired(&self, key: &StorageKey) -> Result<bool, DatabaseError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut retired = write_txn.open_table(RETIRED_BLOBS_TABLE)?;
            retired.remove(key)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

/// Internal helpers.
impl Database {
    fn expiry_key(id: &EntryId, entry: &Entry) -> ExpiryKey {
        ExpiryKey {
            expires_at: entry.expires_at,
            id: id.clone(),
        }
    }
}

/// Metadata operations.
impl Database {
    fn get_maintenance_metadata(&self) -> Option<MaintenanceMetadata> {
        let read_txn = self.db.begin_read().ok()?;
        let table = read_txn.open_table(METADATA_TABLE).ok()?;
        let guard = table.get(METADATA_KEY_MAINTENANCE).ok()??;
        serde_json::from_str(guard.value()).ok()
    }

    pub fn record_sweep(&self, now: SystemTime) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(&MaintenanceMetadata {
            last_sweep_at: Some(now),
        })?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(METADATA_TABLE)?;
            table.insert(METADATA_KEY_MAINTENANCE, json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn last_sweep_at(&self) -> Option<SystemTime> {
        self.get_maintenance_metadata()?.last_sweep_at
    }
}
