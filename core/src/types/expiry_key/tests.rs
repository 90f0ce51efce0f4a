use super::*;
use std::time::{Duration, SystemTime};

fn make_id(s: &str) -> EntryId {
    EntryId::try_new(s.to_string()).unwrap()
}

#[test]
fn expiry_key_normal_usage() {
    let now = SystemTime::now();
    let expiry_key = ExpiryKey {
        expires_at: now,
        id: make_id("valid_id"),
    };

    let bytes = <ExpiryKey as redb::Value>::as_bytes(&expiry_key);
    let from_bytes = <ExpiryKey as redb::Value>::from_bytes(&bytes);
    assert_eq!(expiry_key, from_bytes);
}

#[test]
fn expiry_key_orders_by_time_then_id() {
    let now = SystemTime::now();
    let later = now + Duration::from_secs(10);

    let key1 = ExpiryKey {
        expires_at: now,
        id: make_id("b"),
    };
    let key2 = ExpiryKey {
        expires_at: now,
        id: make_id("c"),
    };
    let key3 = ExpiryKey {
        expires_at: later,
        id: make_id("a"),
    };

    let bytes1 = <ExpiryKey as redb::Value>::as_bytes(&key1);
    let bytes2 = <ExpiryKey as redb::Value>::as_bytes(&key2);
    let bytes3 = <ExpiryKey as redb::Value>::as_bytes(&key3);

    assert_eq!(
        <ExpiryKey as redb::Key>::compare(&bytes1, &bytes2),
        Ordering::Less
    );
    // An earlier expiry sorts first even when its id is larger.
    assert_eq!(
        <ExpiryKey as redb::Key>::compare(&bytes2, &bytes3),
        Ordering::Less
    );
    assert_eq!(
        <ExpiryKey as redb::Key>::compare(&bytes1, &bytes1),
        Ordering::Equal
    );
}

#[test]
fn expiry_key_keeps_subsecond_precision() {
    let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let key = ExpiryKey {
        expires_at: base + Duration::from_nanos(123_456_789),
        id: make_id("x"),
    };

    let bytes = <ExpiryKey as redb::Value>::as_bytes(&key);
    let decoded = <ExpiryKey as redb::Value>::from_bytes(&bytes);
    assert_eq!(decoded.expires_at, key.expires_at);
}
