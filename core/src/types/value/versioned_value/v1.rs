use crate::types::storage_key::StorageKey;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::SystemTime;

use super::ValueVariant;

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub text: Option<String>,
    pub file: Option<FileRecord>,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
    pub instant_expire: bool,
    pub origin_ip: Option<IpAddr>,
}

impl ValueVariant for Entry {
    const VERSION: u8 = 1;
}

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_name: String,
    pub storage_key: StorageKey,
    pub size: u64,
}
