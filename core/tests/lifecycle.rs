use std::time::{Duration, SystemTime};
use vanish_core::core::NewEntry;
use vanish_core::core::retrieval::{Lookup, fetch_info, open_download};
use vanish_core::types::TtlChoice;

mod common;
use common::{blob_files, id, open_store};

/// Verify `is_expired` never flips back once reached.
#[test]
fn test_expiry_is_monotonic() {
    let (store, _temp) = open_store();
    let now = SystemTime::now();
    let entry = store
        .add(NewEntry::new(id("m"), TtlChoice::TenMinutes).with_text("x"), now)
        .unwrap();

    let mut seen_expired = false;
    for secs in (0..1200).step_by(30) {
        let expired = entry.is_expired(now + Duration::from_secs(secs));
        assert!(!seen_expired || expired, "expiry flipped back at {secs}s");
        seen_expired |= expired;
    }
    assert!(seen_expired);
}

/// Verify instant-expire text can be read exactly once.
#[test]
fn test_instant_text_single_read() {
    let (store, _temp) = open_store();
    let now = SystemTime::now();
    store
        .add(
            NewEntry::new(id("note"), TtlChoice::InstantExpire).with_text("read me once"),
            now,
        )
        .unwrap();

    let Lookup::Live(entry) = fetch_info(&store, &id("note"), now).unwrap() else {
        panic!("first read should see the entry");
    };
    assert_eq!(entry.text.as_deref(), Some("read me once"));
    assert_eq!(fetch_info(&store, &id("note"), now).unwrap(), Lookup::Absent);
}

/// Verify an instant-expire file stays visible until downloaded, then its bytes
/// outlive the row only until the grace period ends.
#[test]
fn test_instant_file_consumed_by_download() {
    let (store, temp) = open_store();
    let now = SystemTime::now();
    store
        .add(
            NewEntry::new(id("drop"), TtlChoice::InstantExpire).with_file("drop.zip", &b"PK.."[..]),
            now,
        )
        .unwrap();

    for _ in 0..3 {
        assert!(matches!(
            fetch_info(&store, &id("drop"), now).unwrap(),
            Lookup::Live(ref e) if e.has_file()
        ));
    }

    let download = open_download(&store, &id("drop"), now).unwrap();
    assert!(download.consumed);
    assert_eq!(std::fs::read(&download.location.path).unwrap(), b"PK..");
    assert!(!store.entry_present(&id("drop")).unwrap());

    store.sweep(now + Duration::from_secs(59 * 60)).unwrap();
    assert!(download.location.path.exists());

    store.sweep(now + Duration::from_secs(61 * 60)).unwrap();
    assert!(!download.location.path.exists());
    assert_eq!(blob_files(&temp), 0);
}

/// Verify a one-minute entry and its blob are gone after a sweep past its expiry.
#[test]
fn test_sweep_reclaims_expired_file() {
    let (store, temp) = open_store();
    let now = SystemTime::now();
    store
        .add(
            NewEntry::new(id("min"), TtlChoice::OneMinute).with_file("m.txt", &b"tick"[..]),
            now,
        )
        .unwrap();
    let path = store.blob_location(&id("min")).unwrap().path;

    let outcome = store.sweep(now + Duration::from_secs(61)).unwrap();

    assert_eq!(outcome.entries_removed, vec![id("min")]);
    assert!(!store.entry_present(&id("min")).unwrap());
    assert!(!path.exists());
    assert_eq!(blob_files(&temp), 0);
}

/// Verify an expired-but-unswept entry is still present yet reported as expired.
#[test]
fn test_expired_rows_linger_until_read_or_swept() {
    let (store, _temp) = open_store();
    let now = SystemTime::now();
    store
        .add(NewEntry::new(id("late"), TtlChoice::OneMinute).with_text("x"), now)
        .unwrap();
    let later = now + Duration::from_secs(120);

    assert!(store.entry_present(&id("late")).unwrap());
    assert!(store.get(&id("late")).unwrap().unwrap().is_expired(later));

    assert_eq!(fetch_info(&store, &id("late"), later).unwrap(), Lookup::Expired);
    assert!(!store.entry_present(&id("late")).unwrap());
}
