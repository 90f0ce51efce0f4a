//! Public read model for entries.
//!
//! The `PublicEntry` type is exported as `Entry` from `vanish_core::types`.

use crate::types::entry_id::EntryId;
use crate::types::storage_key::StorageKey;
use std::time::SystemTime;

pub(crate) mod versioned_value;

use versioned_value::latest_value;

/// An entry as seen by readers. The creator's address is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicEntry {
    pub id: EntryId,
    pub text: Option<String>,
    pub file: Option<FileRef>,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
    pub instant_expire: bool,
}

impl PublicEntry {
    pub(crate) fn from_latest(id: EntryId, entry: latest_value::Entry) -> Self {
        Self {
            id,
            text: entry.text,
            file: entry.file.map(|f| FileRef {
                file_name: f.file_name,
                storage_key: f.storage_key,
                size: f.size,
            }),
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            instant_expire: entry.instant_expire,
        }
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// `true` once `now` has reached `expires_at`. Stays true for every later `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub file_name: String,
    pub storage_key: StorageKey,
    pub size: u64,
}

#[cfg(test)]
mod tests;
