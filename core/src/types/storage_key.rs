use redb::TypeName;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Internal name of a blob on disk.
///
/// Always freshly generated; never derived from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageKey(Uuid);

impl StorageKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// File name used for this key inside the blobs directory.
    pub fn file_name(&self) -> String {
        self.0.as_hyphenated().to_string()
    }

    /// Parses a blob file name back into a key. Returns `None` for anything
    /// that is not a canonical hyphenated UUID.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let uuid = Uuid::try_parse(name).ok()?;
        (uuid.as_hyphenated().to_string() == name).then_some(Self(uuid))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl redb::Key for StorageKey {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        data1.cmp(data2)
    }
}

impl redb::Value for StorageKey {
    type SelfType<'a> = StorageKey;
    type AsBytes<'a> = [u8; 16];

    fn fixed_width() -> Option<usize> {
        Some(16)
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        StorageKey(Uuid::from_slice(data).expect("invalid storage key bytes"))
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        *value.0.as_bytes()
    }

    fn type_name() -> TypeName {
        TypeName::new("vanish::StorageKey")
    }
}
