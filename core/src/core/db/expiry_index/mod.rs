use crate::core::db::error::DatabaseError;
use crate::types::{EntryId, ExpiryKey};
use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use std::time::{Duration, SystemTime};

/// Stores `ExpiryKey { expires_at, id }` entries so expired ids can be found
/// with a single range scan, oldest first.
pub struct ExpiryIndex {
    definition: TableDefinition<'static, ExpiryKey, ()>,
}

impl ExpiryIndex {
    pub const fn new(name: &'static str) -> Self {
        Self {
            definition: TableDefinition::new(name),
        }
    }

    pub fn init(&self, txn: &WriteTransaction) -> Result<(), DatabaseError> {
        txn.open_table(self.definition)?;
        Ok(())
    }

    pub fn insert(&self, txn: &WriteTransaction, key: &ExpiryKey) -> Result<(), DatabaseError> {
        let mut table = txn.open_table(self.definition)?;
        table.insert(key, &())?;
        Ok(())
    }

    /// Returns `true` if the key was present.
    pub fn remove(&self, txn: &WriteTransaction, key: &ExpiryKey) -> Result<bool, DatabaseError> {
        let mut table = txn.open_table(self.definition)?;
        Ok(table.remove(key)?.is_some())
    }

    /// Returns ids whose `expires_at <= now`, oldest first.
    pub fn expired_ids(
        &self,
        txn: &ReadTransaction,
        now: SystemTime,
    ) -> Result<Vec<EntryId>, DatabaseError> {
        let Some(bound) = now.checked_add(Duration::from_nanos(1)) else {
            return self.all_ids(txn);
        };

        let table = txn.open_table(self.definition)?;

        table
            .range(
                ..ExpiryKey {
                    expires_at: bound,
                    // SAFETY: This id is only used as a range bound, so the empty
                    // value is never stored.
                    id: unsafe { EntryId::new_unchecked(String::new()) },
                },
            )?
            .map(|item| {
                let (key_guard, _) = item?;
                Ok(key_guard.value().id)
            })
            .collect()
    }

    pub fn all_ids(&self, txn: &ReadTransaction) -> Result<Vec<EntryId>, DatabaseError> {
        let table = txn.open_table(self.definition)?;
        let mut ids = Vec::new();

        for item in table.iter()? {
            let (key_guard, _) = item?;
            ids.push(key_guard.value().id);
        }

        Ok(ids)
    }
}
