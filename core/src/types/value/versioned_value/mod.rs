use redb::TypeName;
pub use v1 as latest_value;

pub mod v1;

pub trait ValueVariant {
    const VERSION: u8;
}

#[derive(Debug, Clone)]
pub enum VersionedEntry {
    V1(v1::Entry),
}

impl VersionedEntry {
    pub fn into_latest(self) -> latest_value::Entry {
        match self {
            VersionedEntry::V1(entry) => entry,
        }
    }
}

impl From<latest_value::Entry> for VersionedEntry {
    fn from(entry: latest_value::Entry) -> Self {
        VersionedEntry::V1(entry)
    }
}

impl redb::Value for VersionedEntry {
    type SelfType<'a> = VersionedEntry;
    type AsBytes<'a> = Vec<u8>;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let (version, data) = data.split_first().expect("empty data");
        match *version {
            v1::Entry::VERSION => {
                let v1 = postcard::from_bytes::<v1::Entry>(data).expect("invalid entry");
                VersionedEntry::V1(v1)
            }
            version => panic!("unsupported version: {}", version),
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        match value {
            VersionedEntry::V1(v1) => postcard::to_extend(v1, vec![v1::Entry::VERSION]).unwrap(),
        }
    }

    fn type_name() -> TypeName {
        TypeName::new("vanish::Entry")
    }
}
