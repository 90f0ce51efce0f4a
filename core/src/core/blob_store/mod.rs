//! On-disk blob bytes, one file per [`StorageKey`] under the blobs directory.

use crate::types::StorageKey;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub mod error {
    use crate::types::StorageKey;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum BlobStoreError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Blob not found: {0}")]
        NotFound(StorageKey),

        #[error("File exceeds the {max} byte limit")]
        FileTooLarge { max: u64 },
    }
}

use error::BlobStoreError;

const PARTIAL_EXTENSION: &str = "part";

pub struct BlobStore {
    pub blobs_path: PathBuf,
    pub max_file_bytes: u64,
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Write operations.
impl BlobStore {
    /// Streams `source` into a new blob and returns its key and size.
    ///
    /// Bytes land in `<key>.part` first and are renamed into place once fully
    /// written, so a visible blob is always complete. Nothing is left behind
    /// on failure.
    pub fn put(&self, source: impl Read) -> Result<(StorageKey, u64), BlobStoreError> {
        std::fs::create_dir_all(&self.blobs_path)?;

        let key = StorageKey::generate();
        let partial = self.partial_path(&key);

        match self.write_partial(&partial, source) {
            Ok(size) => {
                if let Err(e) = std::fs::rename(&partial, self.blob_path(&key)) {
                    let _ = std::fs::remove_file(&partial);
                    return Err(e.into());
                }
                Ok((key, size))
            }
            Err(e) => {
                let _ = std::fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    fn write_partial(&self, partial: &Path, source: impl Read) -> Result<u64, BlobStoreError> {
        let mut file = File::create(partial)?;
        // One byte past the limit is enough to detect an oversized source.
        let mut limited = source.take(self.max_file_bytes.saturating_add(1));
        let size = io::copy(&mut limited, &mut file)?;
        if size > self.max_file_bytes {
            return Err(BlobStoreError::FileTooLarge {
                max: self.max_file_bytes,
            });
        }
        file.flush()?;
        file.sync_all()?;
        Ok(size)
    }

    /// Removes a blob. Missing blobs are not an error.
    pub fn delete(&self, key: &StorageKey) -> Result<(), BlobStoreError> {
        ignore_not_found(std::fs::remove_file(self.blob_path(key)))?;
        Ok(())
    }

    /// Removes a leftover `.part` file from an interrupted write.
    pub fn delete_partial(&self, key: &StorageKey) -> Result<(), BlobStoreError> {
        ignore_not_found(std::fs::remove_file(self.partial_path(key)))?;
        Ok(())
    }
}

/// Read operations.
impl BlobStore {
    pub fn blob_path(&self, key: &StorageKey) -> PathBuf {
        self.blobs_path.join(key.file_name())
    }

    fn partial_path(&self, key: &StorageKey) -> PathBuf {
        self.blob_path(key).with_extension(PARTIAL_EXTENSION)
    }

    /// Returns the location of an existing blob.
    pub fn path(&self, key: &StorageKey) -> Result<PathBuf, BlobStoreError> {
        let path = self.blob_path(key);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BlobStoreError::NotFound(*key))
        }
    }

    pub fn modified_at(&self, key: &StorageKey) -> Result<SystemTime, BlobStoreError> {
        Self::file_modified_at(&self.blob_path(key), key)
    }

    pub fn partial_modified_at(&self, key: &StorageKey) -> Result<SystemTime, BlobStoreError> {
        Self::file_modified_at(&self.partial_path(key), key)
    }

    fn file_modified_at(path: &Path, key: &StorageKey) -> Result<SystemTime, BlobStoreError> {
        match std::fs::metadata(path) {
            Ok(metadata) => Ok(metadata.modified()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BlobStoreError::NotFound(*key)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Listing operations.
impl BlobStore {
    /// Keys of all complete blobs. Files with foreign names are ignored.
    pub fn list_keys(&self) -> Result<Vec<StorageKey>, BlobStoreError> {
        self.list_with(|path| {
            path.extension()
                .is_none()
                .then(|| path.file_name()?.to_str())
                .flatten()
        })
    }

    /// Keys of `.part` files left by interrupted writes.
    pub fn list_partial_keys(&self) -> Result<Vec<StorageKey>, BlobStoreError> {
        self.list_with(|path| {
            path.extension()
                .is_some_and(|e| e == PARTIAL_EXTENSION)
                .then(|| path.file_stem()?.to_str())
                .flatten()
        })
    }

    fn list_with(
        &self,
        name_of: impl for<'a> Fn(&'a Path) -> Option<&'a str>,
    ) -> Result<Vec<StorageKey>, BlobStoreError> {
        if !self.blobs_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.blobs_path)? {
            let path = entry?.path();
            if path.is_file()
                && let Some(key) = name_of(&path).and_then(StorageKey::from_file_name)
            {
                keys.push(key);
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests;
