//! Expiring share store combining the entry database and blob storage.

use crate::core::blob_store::BlobStore;
use crate::core::db::Database;
use crate::types::value::versioned_value::latest_value;
use crate::types::value::versioned_value::latest_value::FileRecord;
use crate::types::{Config, Entry, EntryId, SavedConfig, StorageKey, TtlChoice};
use error::StoreError;
use std::io::{self, Read};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

pub(crate) mod blob_store;
pub mod clock;
pub(crate) mod db;
mod entry_store;
pub mod retrieval;
pub mod sweeper;

pub use blob_store::error::BlobStoreError;
pub use db::error::DatabaseError;
pub use entry_store::EntryStore;

pub mod error {
    use super::*;
    use crate::types::{EntryIdError, InvalidTtl};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("Database error: {0}")]
        Database(#[from] DatabaseError),

        #[error("Blob store error: {0}")]
        BlobStore(#[from] BlobStoreError),

        #[error("Entry needs text or a non-empty file")]
        EmptyEntry,

        #[error("Text exceeds {max} characters")]
        TextTooLong { max: usize },

        #[error("Invalid file name: {0:?}")]
        InvalidFileName(String),

        #[error("Invalid entry id: {0}")]
        InvalidId(#[from] EntryIdError),

        #[error(transparent)]
        InvalidTtl(#[from] InvalidTtl),

        #[error("Entry already exists: {0}")]
        AlreadyExists(EntryId),

        #[error("Entry not found: {0}")]
        NotFound(EntryId),

        #[error("Entry has no file: {0}")]
        NoFile(EntryId),
    }

    /// Coarse classification for mapping failures onto client-facing statuses.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ErrorKind {
        InvalidArgument,
        InvalidTtl,
        AlreadyExists,
        NotFound,
        Io,
    }

    impl StoreError {
        pub fn kind(&self) -> ErrorKind {
            match self {
                StoreError::EmptyEntry
                | StoreError::TextTooLong { .. }
                | StoreError::InvalidFileName(_)
                | StoreError::InvalidId(_)
                | StoreError::BlobStore(BlobStoreError::FileTooLarge { .. }) => {
                    ErrorKind::InvalidArgument
                }
                StoreError::InvalidTtl(_) => ErrorKind::InvalidTtl,
                StoreError::AlreadyExists(_)
                | StoreError::Database(DatabaseError::AlreadyExists) => ErrorKind::AlreadyExists,
                StoreError::NotFound(_)
                | StoreError::NoFile(_)
                | StoreError::BlobStore(BlobStoreError::NotFound(_))
                | StoreError::Database(DatabaseError::NotFound | DatabaseError::NoFile) => {
                    ErrorKind::NotFound
                }
                StoreError::Database(_) | StoreError::BlobStore(_) => ErrorKind::Io,
            }
        }
    }
}

pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// A request to create an entry. Built with [`NewEntry::new`] and the `with_*` methods.
#[derive(Debug)]
pub struct NewEntry<R = io::Empty> {
    pub id: EntryId,
    pub text: Option<String>,
    pub file: Option<Upload<R>>,
    pub ttl: TtlChoice,
    /// Forces instant expire regardless of `ttl`.
    pub instant_expire: bool,
    pub origin_ip: Option<IpAddr>,
}

#[derive(Debug)]
pub struct Upload<R> {
    pub file_name: String,
    pub reader: R,
}

impl NewEntry {
    pub fn new(id: EntryId, ttl: TtlChoice) -> Self {
        Self {
            id,
            text: None,
            file: None,
            ttl,
            instant_expire: false,
            origin_ip: None,
        }
    }
}

impl<R> NewEntry<R> {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_file<F: Read>(self, file_name: impl Into<String>, reader: F) -> NewEntry<F> {
        NewEntry {
            id: self.id,
            text: self.text,
            file: Some(Upload {
                file_name: file_name.into(),
                reader,
            }),
            ttl: self.ttl,
            instant_expire: self.instant_expire,
            origin_ip: self.origin_ip,
        }
    }

    pub fn with_instant_expire(mut self, instant_expire: bool) -> Self {
        self.instant_expire = instant_expire;
        self
    }

    pub fn with_origin_ip(mut self, ip: IpAddr) -> Self {
        self.origin_ip = Some(ip);
        self
    }
}

/// Where a file's bytes can be streamed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub entries_removed: Vec<EntryId>,
    pub blobs_removed: usize,
    pub retired_blobs_removed: usize,
    pub orphaned_blobs_removed: usize,
    /// Per-item cleanup failures that were logged and skipped.
    pub failures: usize,
}

impl SweepOutcome {
    pub fn is_noop(&self) -> bool {
        self.entries_removed.is_empty()
            && self.retired_blobs_removed == 0
            && self.orphaned_blobs_removed == 0
            && self.failures == 0
    }
}

pub struct ShareStore {
    base_path: PathBuf,
    db: Database,
    blobs: BlobStore,
    saved: SavedConfig,
}

impl ShareStore {
    pub fn open(config: Config) -> Result<Self, StoreError> {
        let blobs = BlobStore {
            blobs_path: config.blobs_path(),
            max_file_bytes: config.saved.max_file_bytes,
        };
        std::fs::create_dir_all(&blobs.blobs_path).map_err(BlobStoreError::from)?;

        let db = Database::new(&config)?;
        info!(path = %config.base_path.display(), "Opened share store");

        Ok(Self {
            base_path: config.base_path,
            db,
            blobs,
            saved: config.saved,
        })
    }

    /// Returns the base data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.base_path
    }

    fn map_db_error(id: &EntryId, error: DatabaseError) -> StoreError {
        match error {
            DatabaseError::NotFound => StoreError::NotFound(id.clone()),
            DatabaseError::AlreadyExists => StoreError::AlreadyExists(id.clone()),
            DatabaseError::NoFile => StoreError::NoFile(id.clone()),
            other => StoreError::Database(other),
        }
    }
}

/// Read operations.
impl ShareStore {
    pub fn entry_present(&self, id: &EntryId) -> Result<bool, StoreError> {
        Ok(self.db.contains(id)?)
    }

    pub fn get(&self, id: &EntryId) -> Result<Option<Entry>, StoreError> {
        let entry = self.db.get(id)?;
        Ok(entry.map(|e| Entry::from_latest(id.clone(), e)))
    }

    pub fn blob_location(&self, id: &EntryId) -> Result<BlobLocation, StoreError> {
        let entry = self
            .db
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let file = entry.file.ok_or_else(|| StoreError::NoFile(id.clone()))?;
        let path = self.blobs.path(&file.storage_key)?;

        Ok(BlobLocation {
            path,
            file_name: file.file_name,
            size: file.size,
        })
    }

    /// Creator address, for abuse tracking only.
    pub fn origin_ip(&self, id: &EntryId) -> Result<Option<IpAddr>, StoreError> {
        let entry = self
            .db
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(entry.origin_ip)
    }

    pub fn last_sweep_at(&self) -> Option<SystemTime> {
        self.db.last_sweep_at()
    }
}

/// Create operations.
impl ShareStore {
    /// Creates an entry. The blob, if any, is fully written before the row
    /// is committed and is removed again if the commit fails.
    pub fn add<R: Read>(&self, entry: NewEntry<R>, now: SystemTime) -> Result<Entry, StoreError> {
        let NewEntry {
            id,
            text,
            file,
            ttl,
            instant_expire,
            origin_ip,
        } = entry;

        let text = text.filter(|t| !t.is_empty());
        if text.is_none() && file.is_none() {
            return Err(StoreError::EmptyEntry);
        }
        if let Some(text) = &text
            && text.chars().count() > self.saved.max_text_chars
        {
            return Err(StoreError::TextTooLong {
                max: self.saved.max_text_chars,
            });
        }
        if let Some(upload) = &file {
            Self::validate_file_name(&upload.file_name)?;
        }

        if self.db.contains(&id)? {
            return Err(StoreError::AlreadyExists(id));
        }

        let file = match file {
            Some(upload) => self.store_upload(upload)?,
            None => None,
        };
        if text.is_none() && file.is_none() {
            return Err(StoreError::EmptyEntry);
        }

        let instant_expire = instant_expire || ttl.is_instant_expire();
        let lifetime = if instant_expire {
            TtlChoice::INSTANT_EXPIRE_SAFETY_NET
        } else {
            ttl.duration()
        };

        let record = latest_value::Entry {
            text,
            file,
            created_at: now,
            expires_at: now + lifetime,
            instant_expire,
            origin_ip,
        };

        if let Err(e) = self.db.insert(&id, &record) {
            if let Some(file) = &record.file {
                self.discard_blob(&file.storage_key);
            }
            return Err(Self::map_db_error(&id, e));
        }

        debug!(
            id = %id,
            ttl = %ttl,
            has_file = record.file.is_some(),
            instant_expire,
            "Added entry"
        );
        Ok(Entry::from_latest(id, record))
    }

    fn validate_file_name(file_name: &str) -> Result<(), StoreError> {
        let valid = !file_name.trim().is_empty()
            && file_name.chars().count() <= MAX_FILE_NAME_LENGTH
            && !file_name.chars().any(char::is_control);

        if valid {
            Ok(())
        } else {
            Err(StoreError::InvalidFileName(file_name.to_string()))
        }
    }

    /// Writes the upload. A zero-byte upload counts as no file.
    fn store_upload<R: Read>(&self, upload: Upload<R>) -> Result<Option<FileRecord>, StoreError> {
        let (storage_key, size) = self.blobs.put(upload.reader)?;
        if size == 0 {
            self.discard_blob(&storage_key);
            return Ok(None);
        }

        Ok(Some(FileRecord {
            file_name: upload.file_name,
            storage_key,
            size,
        }))
    }

    fn discard_blob(&self, key: &StorageKey) {
        if let Err(e) = self.blobs.delete(key) {
            warn!(key = %key, error = %e, "Failed to discard blob, leaving it to the orphan sweep");
        }
    }
}

/// Delete operations.
impl ShareStore {
    /// Removes the row and its blob.
    pub fn delete(&self, id: &EntryId) -> Result<Entry, StoreError> {
        let entry = self
            .db
            .remove(id)
            .map_err(|e| Self::map_db_error(id, e))?;

        // Only the caller whose transaction removed the row gets here.
        if let Some(file) = &entry.file {
            self.blobs.delete(&file.storage_key)?;
        }

        debug!(id = %id, "Deleted entry");
        Ok(Entry::from_latest(id.clone(), entry))
    }

    /// Consumes a file-bearing entry for download.
    ///
    /// The row disappears immediately; the bytes stay readable until
    /// `now + retired_blob_grace` (capped at [`SavedConfig::MAX_GRACE`]), after
    /// which the sweep deletes them.
    pub fn take_blob(&self, id: &EntryId, now: SystemTime) -> Result<BlobLocation, StoreError> {
        let grace = self.saved.retired_blob_grace.min(SavedConfig::MAX_GRACE);
        let deadline = now.checked_add(grace).unwrap_or(now);
        let entry = self
            .db
            .retire(id, deadline)
            .map_err(|e| Self::map_db_error(id, e))?;
        let file = entry.file.ok_or_else(|| StoreError::NoFile(id.clone()))?;
        let path = self.blobs.path(&file.storage_key)?;

        debug!(id = %id, key = %file.storage_key, "Consumed entry for download");
        Ok(BlobLocation {
            path,
            file_name: file.file_name,
            size: file.size,
        })
    }
}

/// Maintenance operations.
impl ShareStore {
    /// Reclaims expired entries, retired blobs past their deadline and
    /// orphaned blob files. Per-item failures are logged and counted.
    pub fn sweep(&self, now: SystemTime) -> Result<SweepOutcome, StoreError> {
        let mut outcome = SweepOutcome::default();

        self.sweep_expired_entries(now, &mut outcome)?;
        self.sweep_retired_blobs(now, &mut outcome)?;
        self.sweep_orphaned_blobs(now, &mut outcome)?;
        self.db.record_sweep(now)?;

        if outcome.is_noop() {
            debug!("Sweep found nothing to reclaim");
        } else {
            info!(
                entries = outcome.entries_removed.len(),
                blobs = outcome.blobs_removed,
                retired_blobs = outcome.retired_blobs_removed,
                orphaned_blobs = outcome.orphaned_blobs_removed,
                failures = outcome.failures,
                "Sweep reclaimed storage"
            );
        }

        Ok(outcome)
    }

    fn sweep_expired_entries(
        &self,
        now: SystemTime,
        outcome: &mut SweepOutcome,
    ) -> Result<(), StoreError> {
        for id in self.db.expired_ids(now)? {
            // One transaction per row keeps writers waiting for at most one row.
            let entry = match self.db.remove_if_expired(&id, now) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to remove expired entry");
                    outcome.failures += 1;
                    continue;
                }
            };

            if let Some(file) = &entry.file {
                match self.blobs.delete(&file.storage_key) {
                    Ok(()) => outcome.blobs_removed += 1,
                    Err(e) => {
                        warn!(
                            id = %id,
                            key = %file.storage_key,
                            error = %e,
                            "Failed to delete blob of expired entry"
                        );
                        outcome.failures += 1;
                    }
                }
            }

            debug!(id = %id, "Removed expired entry");
            outcome.entries_removed.push(id);
        }

        Ok(())
    }

    fn sweep_retired_blobs(
        &self,
        now: SystemTime,
        outcome: &mut SweepOutcome,
    ) -> Result<(), StoreError> {
        for key in self.db.due_retired_blobs(now)? {
            match self.blobs.delete(&key) {
                Ok(()) => outcome.retired_blobs_removed += 1,
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to delete retired blob");
                    outcome.failures += 1;
                }
            }

            if let Err(e) = self.db.forget_retired(&key) {
                warn!(key = %key, error = %e, "Failed to drop retired blob record");
                outcome.failures += 1;
            }
        }

        Ok(())
    }

    fn sweep_orphaned_blobs(
        &self,
        now: SystemTime,
        outcome: &mut SweepOutcome,
    ) -> Result<(), StoreError> {
        // Read references before listing files: a blob written after this
        // point is younger than the grace period and therefore skipped.
        let referenced = self.db.referenced_blobs()?;
        let grace = self.saved.orphan_grace;
        let is_stale =
            |modified: SystemTime| now.duration_since(modified).is_ok_and(|age| age >= grace);

        for key in self.blobs.list_keys()? {
            if referenced.contains(&key) {
                continue;
            }
            match self.blobs.modified_at(&key) {
                Ok(modified) if is_stale(modified) => match self.blobs.delete(&key) {
                    Ok(()) => {
                        debug!(key = %key, "Removed orphaned blob");
                        outcome.orphaned_blobs_removed += 1;
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Failed to delete orphaned blob");
                        outcome.failures += 1;
                    }
                },
                Ok(_) | Err(BlobStoreError::NotFound(_)) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to inspect blob");
                    outcome.failures += 1;
                }
            }
        }

        for key in self.blobs.list_partial_keys()? {
            match self.blobs.partial_modified_at(&key) {
                Ok(modified) if is_stale(modified) => match self.blobs.delete_partial(&key) {
                    Ok(()) => outcome.orphaned_blobs_removed += 1,
                    Err(e) => {
                        warn!(key = %key, error = %e, "Failed to delete partial blob");
                        outcome.failures += 1;
                    }
                },
                Ok(_) | Err(BlobStoreError::NotFound(_)) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to inspect partial blob");
                    outcome.failures += 1;
                }
            }
        }

        Ok(())
    }
}

impl EntryStore for ShareStore {
    fn entry_present(&self, id: &EntryId) -> Result<bool, StoreError> {
        ShareStore::entry_present(self, id)
    }

    fn add<R: Read>(&self, entry: NewEntry<R>, now: SystemTime) -> Result<Entry, StoreError> {
        ShareStore::add(self, entry, now)
    }

    fn get(&self, id: &EntryId) -> Result<Option<Entry>, StoreError> {
        ShareStore::get(self, id)
    }

    fn blob_location(&self, id: &EntryId) -> Result<BlobLocation, StoreError> {
        ShareStore::blob_location(self, id)
    }

    fn delete(&self, id: &EntryId) -> Result<Entry, StoreError> {
        ShareStore::delete(self, id)
    }

    fn take_blob(&self, id: &EntryId, now: SystemTime) -> Result<BlobLocation, StoreError> {
        ShareStore::take_blob(self, id, now)
    }

    fn sweep(&self, now: SystemTime) -> Result<SweepOutcome, StoreError> {
        ShareStore::sweep(self, now)
    }
}
