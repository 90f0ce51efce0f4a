use super::*;
use std::time::Duration;

fn entry_expiring_at(expires_at: SystemTime, file: Option<FileRef>) -> PublicEntry {
    PublicEntry {
        id: EntryId::try_new("entry".to_string()).unwrap(),
        text: Some("text".to_string()),
        file,
        created_at: expires_at - Duration::from_secs(60),
        expires_at,
        instant_expire: false,
    }
}

#[test]
fn not_expired_before_deadline() {
    let deadline = SystemTime::now();
    let entry = entry_expiring_at(deadline, None);
    assert!(!entry.is_expired(deadline - Duration::from_nanos(1)));
}

#[test]
fn expired_exactly_at_deadline() {
    let deadline = SystemTime::now();
    let entry = entry_expiring_at(deadline, None);
    assert!(entry.is_expired(deadline));
}

#[test]
fn expiry_is_monotonic() {
    let deadline = SystemTime::now();
    let entry = entry_expiring_at(deadline, None);

    let mut seen_expired = false;
    for offset in (0..240).map(|s| Duration::from_secs(s)) {
        let at = deadline - Duration::from_secs(120) + offset;
        let expired = entry.is_expired(at);
        assert!(!(seen_expired && !expired), "expiry flipped back at {offset:?}");
        seen_expired |= expired;
    }
    assert!(seen_expired);
}

#[test]
fn has_file_follows_file_ref() {
    let now = SystemTime::now();
    assert!(!entry_expiring_at(now, None).has_file());

    let file = FileRef {
        file_name: "a.bin".to_string(),
        storage_key: StorageKey::generate(),
        size: 1,
    };
    assert!(entry_expiring_at(now, Some(file)).has_file());
}
