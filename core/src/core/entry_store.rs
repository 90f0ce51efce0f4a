//! The operations every entry store offers, independent of its backing storage.

use crate::core::error::StoreError;
use crate::core::{BlobLocation, NewEntry, SweepOutcome};
use crate::types::{Entry, EntryId};
use std::io::Read;
use std::time::SystemTime;

pub trait EntryStore: Send + Sync {
    /// True iff a row exists, expired or not.
    fn entry_present(&self, id: &EntryId) -> Result<bool, StoreError>;

    fn add<R: Read>(&self, entry: NewEntry<R>, now: SystemTime) -> Result<Entry, StoreError>;

    /// Side-effect free; callers check [`Entry::is_expired`] themselves.
    fn get(&self, id: &EntryId) -> Result<Option<Entry>, StoreError>;

    fn blob_location(&self, id: &EntryId) -> Result<BlobLocation, StoreError>;

    fn delete(&self, id: &EntryId) -> Result<Entry, StoreError>;

    /// Removes the entry but keeps its bytes until the retired-blob deadline.
    fn take_blob(&self, id: &EntryId, now: SystemTime) -> Result<BlobLocation, StoreError>;

    fn sweep(&self, now: SystemTime) -> Result<SweepOutcome, StoreError>;
}
