#![allow(dead_code)]

use tempfile::TempDir;
use vanish_core::core::ShareStore;
use vanish_core::types::{Config, EntryId};

pub fn open_store() -> (ShareStore, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = ShareStore::open(Config::new(temp.path())).unwrap();
    (store, temp)
}

pub fn id(s: &str) -> EntryId {
    EntryId::try_new(s.to_string()).unwrap()
}

pub fn blob_files(temp: &TempDir) -> usize {
    std::fs::read_dir(temp.path().join("blobs")).unwrap().count()
}
