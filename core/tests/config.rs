use std::time::SystemTime;
use tempfile::TempDir;
use vanish_core::core::error::StoreError;
use vanish_core::core::{NewEntry, ShareStore};
use vanish_core::types::{AppConfig, TtlChoice};

mod common;
use common::id;

fn store_from_toml(temp: &TempDir, toml: &str) -> ShareStore {
    let path = temp.path().join("vanish.toml");
    let toml = toml.replace("{data}", &temp.path().join("data").display().to_string());
    std::fs::write(&path, toml).unwrap();

    let app = AppConfig::load(&path).unwrap().with_defaults_for_invalid();
    ShareStore::open(app.store_config()).unwrap()
}

/// Verify the text limit configured in TOML is enforced by the store.
#[test]
fn test_text_limit_from_config() {
    let temp = TempDir::new().unwrap();
    let store = store_from_toml(
        &temp,
        "[storage]\ndata_dir = \"{data}\"\n\n[limits]\nmax_text_chars = 4\n",
    );

    store
        .add(NewEntry::new(id("ok"), TtlChoice::OneMinute).with_text("four"), SystemTime::now())
        .unwrap();
    let err = store
        .add(NewEntry::new(id("no"), TtlChoice::OneMinute).with_text("fives"), SystemTime::now())
        .unwrap_err();

    assert!(matches!(err, StoreError::TextTooLong { max: 4 }));
}

/// Verify the file limit configured in TOML is enforced by the store.
#[test]
fn test_file_limit_from_config() {
    let temp = TempDir::new().unwrap();
    let store = store_from_toml(
        &temp,
        "[storage]\ndata_dir = \"{data}\"\n\n[limits]\nmax_file_mib = 1\n",
    );
    let big = vec![0u8; 1024 * 1024 + 1];

    let err = store
        .add(
            NewEntry::new(id("big"), TtlChoice::OneMinute).with_file("big.bin", big.as_slice()),
            SystemTime::now(),
        )
        .unwrap_err();

    assert!(matches!(err, StoreError::BlobStore(_)));
    assert!(!store.entry_present(&id("big")).unwrap());
}

/// Verify the store lives under the configured data directory.
#[test]
fn test_data_dir_from_config() {
    let temp = TempDir::new().unwrap();
    let store = store_from_toml(&temp, "[storage]\ndata_dir = \"{data}\"\n");

    assert_eq!(store.data_dir(), temp.path().join("data"));
    assert!(temp.path().join("data").join("vanish.redb").exists());
    assert!(temp.path().join("data").join("blobs").is_dir());
}

/// Verify an out-of-range grace period neither breaks instant-expire downloads
/// nor survives repair.
#[test]
fn test_huge_retired_grace_is_safe() {
    use vanish_core::core::retrieval::open_download;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vanish.toml");
    let data = temp.path().join("data");
    std::fs::write(
        &path,
        format!(
            "[storage]\ndata_dir = \"{}\"\n\n[sweep]\nretired_blob_grace_secs = {}\n",
            data.display(),
            u64::MAX
        ),
    )
    .unwrap();

    let app = AppConfig::load(&path).unwrap();
    assert_eq!(app.validate().len(), 1);
    assert_eq!(app.with_defaults_for_invalid().sweep.retired_blob_grace_secs, 3600);

    let store = ShareStore::open(app.store_config()).unwrap();
    let now = SystemTime::now();
    store
        .add(
            NewEntry::new(id("y"), TtlChoice::InstantExpire).with_file("y.txt", &b"bytes"[..]),
            now,
        )
        .unwrap();

    let download = open_download(&store, &id("y"), now).unwrap();

    assert!(download.consumed);
    assert_eq!(std::fs::read(&download.location.path).unwrap(), b"bytes");
}
