pub(crate) mod config;
pub use config::{
    AppConfig, AppConfigError, Config, LimitsConfig, SavedConfig, StorageConfig, SweepConfig,
    SweepSettings,
};

pub(crate) mod entry_id;
pub use entry_id::{EntryId, EntryIdError, MAX_ID_LENGTH};

pub(crate) mod storage_key;
pub use storage_key::StorageKey;

pub(crate) mod ttl;
pub use ttl::{InvalidTtl, TtlChoice};

pub(crate) mod value;
pub use value::PublicEntry as Entry;
pub use value::FileRef;

pub(crate) mod expiry_key;
pub use expiry_key::ExpiryKey;

pub(crate) mod metadata;
