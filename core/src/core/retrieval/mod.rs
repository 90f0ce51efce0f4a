//! Read paths used at the request boundary.
//!
//! Both functions apply expiry lazily: an expired row found here is deleted on
//! the spot instead of waiting for the next sweep. They also consume
//! instant-expire entries. Text-only entries go on their first metadata read,
//! file entries on their first download.

use crate::core::EntryStore;
use crate::core::error::StoreError;
use crate::core::BlobLocation;
use crate::types::{Entry, EntryId};
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Absent,
    /// The row existed but had expired. It has been removed.
    Expired,
    Live(Entry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub location: BlobLocation,
    /// `true` when this download consumed an instant-expire entry.
    pub consumed: bool,
}

pub fn fetch_info<S: EntryStore>(
    store: &S,
    id: &EntryId,
    now: SystemTime,
) -> Result<Lookup, StoreError> {
    let Some(entry) = store.get(id)? else {
        return Ok(Lookup::Absent);
    };

    if entry.is_expired(now) {
        discard(store, id)?;
        return Ok(Lookup::Expired);
    }

    if entry.instant_expire && !entry.has_file() {
        // Whoever removes the row owns the single read.
        if !discard(store, id)? {
            return Ok(Lookup::Absent);
        }
        debug!(id = %id, "Consumed text entry on read");
    }

    Ok(Lookup::Live(entry))
}

pub fn open_download<S: EntryStore>(
    store: &S,
    id: &EntryId,
    now: SystemTime,
) -> Result<Download, StoreError> {
    let entry = store
        .get(id)?
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;

    if entry.is_expired(now) {
        discard(store, id)?;
        return Err(StoreError::NotFound(id.clone()));
    }
    if !entry.has_file() {
        return Err(StoreError::NoFile(id.clone()));
    }

    if entry.instant_expire {
        let location = store.take_blob(id, now)?;
        return Ok(Download {
            location,
            consumed: true,
        });
    }

    Ok(Download {
        location: store.blob_location(id)?,
        consumed: false,
    })
}

/// Deletes `id`, returning `false` if a concurrent caller removed it first.
fn discard<S: EntryStore>(store: &S, id: &EntryId) -> Result<bool, StoreError> {
    match store.delete(id) {
        Ok(_) => Ok(true),
        Err(StoreError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
