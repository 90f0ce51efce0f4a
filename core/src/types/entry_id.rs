use nutype::nutype;
use redb::TypeName;
use std::cmp::Ordering;
use std::str;

pub const MAX_ID_LENGTH: usize = 256;

/// Public identifier of an entry.
///
/// Chosen by the uploader and used verbatim as the lookup key. It never
/// names anything on disk; blobs live under a [`StorageKey`](super::StorageKey).
#[nutype(
    new_unchecked,
    validate(
        not_empty,
        len_char_max = MAX_ID_LENGTH,
        predicate = |s: &str| !s.chars().any(char::is_control)
    ),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Hash,
        Borrow,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct EntryId(String);

impl redb::Key for EntryId {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        let s1 = str::from_utf8(data1).expect("invalid UTF-8 in entry id");
        let s2 = str::from_utf8(data2).expect("invalid UTF-8 in entry id");

        s1.cmp(s2)
    }
}

impl redb::Value for EntryId {
    type SelfType<'a> = Self;
    type AsBytes<'a> = &'a [u8];

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let s = str::from_utf8(data).expect("invalid UTF-8 in entry id");
        Self::try_new(s.to_owned()).expect("invalid entry id in database")
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        value.as_bytes()
    }

    fn type_name() -> TypeName {
        TypeName::new("vanish::EntryId")
    }
}
