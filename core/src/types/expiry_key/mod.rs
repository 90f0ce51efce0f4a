use crate::types::entry_id::EntryId;
use redb::TypeName;
use std::cmp::Ordering;
use std::time::{Duration, SystemTime};

/// Index key ordering entries by expiry time, then by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryKey {
    pub expires_at: SystemTime,
    pub id: EntryId,
}

fn extract_duration(data: &[u8]) -> (Duration, &[u8]) {
    let (secs, data) = data.split_first_chunk::<8>().unwrap();
    let secs = u64::from_be_bytes(*secs);
    let (nanos, data) = data.split_first_chunk::<4>().unwrap();
    let nanos = u32::from_be_bytes(*nanos);

    (Duration::new(secs, nanos), data)
}

impl redb::Key for ExpiryKey {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        let (data1_duration, data1) = extract_duration(data1);
        let (data2_duration, data2) = extract_duration(data2);

        data1_duration
            .cmp(&data2_duration)
            .then_with(|| <EntryId as redb::Key>::compare(data1, data2))
    }
}

impl redb::Value for ExpiryKey {
    type SelfType<'a> = ExpiryKey;
    type AsBytes<'a> = Vec<u8>;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let (since_epoch, data) = extract_duration(data);
        let id = <EntryId as redb::Value>::from_bytes(data);

        ExpiryKey {
            expires_at: SystemTime::UNIX_EPOCH + since_epoch,
            id,
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        // Pre-epoch instants collapse to the epoch; they are expired either way.
        let since_epoch = value
            .expires_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&since_epoch.as_secs().to_be_bytes());
        bytes.extend_from_slice(&since_epoch.subsec_nanos().to_be_bytes());
        bytes.extend_from_slice(<EntryId as redb::Value>::as_bytes(&value.id));
        bytes
    }

    fn type_name() -> TypeName {
        TypeName::new("vanish::ExpiryKey")
    }
}

#[cfg(test)]
mod tests;
