// tests/unit_snapshot_test.rs

//! The snapshot loader: the embedded empty dump, hand-built dump files with
//! and without expiries, and the expiry filter applied on merge.

use citrinedb::core::storage::data_types::{DataValue, now_ms};
use citrinedb::core::storage::snapshot::{self, EMPTY_SNAPSHOT};
use citrinedb::core::storage::Store;
use std::io::Write;

/// Builds a minimal dump: header, one database, the given string entries.
fn build_dump(entries: &[(&str, &str, Option<u64>)]) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.extend_from_slice(b"REDIS0011");
    raw.push(0xFE); // select db 0
    raw.push(0x00);
    raw.push(0xFB); // resize hints
    raw.push(entries.len() as u8);
    raw.push(0x00);
    for (key, value, expiry) in entries {
        if let Some(ms) = expiry {
            raw.push(0xFC);
            raw.extend_from_slice(&ms.to_le_bytes());
        }
        raw.push(0x00); // string type
        raw.push(key.len() as u8);
        raw.extend_from_slice(key.as_bytes());
        raw.push(value.len() as u8);
        raw.extend_from_slice(value.as_bytes());
    }
    raw.push(0xFF);
    raw.extend_from_slice(&[0u8; 8]); // checksum, not verified
    raw
}

#[test]
fn test_empty_snapshot_starts_with_magic_and_parses_to_nothing() {
    assert!(EMPTY_SNAPSHOT.starts_with(b"REDIS0011"));
    let entries = snapshot::parse_snapshot(&EMPTY_SNAPSHOT).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_parse_string_entries() {
    let raw = build_dump(&[("foo", "bar", None), ("baz", "qux", None)]);
    let entries = snapshot::parse_snapshot(&raw).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(&entries[0].key[..], b"foo");
    assert_eq!(entries[0].value, DataValue::String("bar".into()));
    assert_eq!(entries[0].expires_at_ms, None);
    assert_eq!(&entries[1].key[..], b"baz");
}

#[test]
fn test_parse_entry_with_expiry() {
    let deadline = now_ms() + 60_000;
    let raw = build_dump(&[("temp", "v", Some(deadline))]);
    let entries = snapshot::parse_snapshot(&raw).unwrap();
    assert_eq!(entries[0].expires_at_ms, Some(deadline));
}

#[test]
fn test_merge_skips_already_expired_entries() {
    let raw = build_dump(&[("dead", "v", Some(1_000)), ("alive", "v", None)]);
    let entries = snapshot::parse_snapshot(&raw).unwrap();

    let mut store = Store::new();
    store.load_snapshot_entries(entries);
    assert_eq!(store.len(), 1);
    assert!(store.get(&bytes::Bytes::from_static(b"alive")).is_some());
}

#[test]
fn test_bad_magic_is_rejected() {
    let err = snapshot::parse_snapshot(b"NOTRD0011\xFF").unwrap_err();
    assert!(err.to_string().contains("magic"));
}

#[test]
fn test_truncated_dump_is_rejected() {
    let mut raw = build_dump(&[("foo", "bar", None)]);
    raw.truncate(12);
    assert!(snapshot::parse_snapshot(&raw).is_err());
}

#[test]
fn test_load_file_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let raw = build_dump(&[("disk", "value", None)]);
    let path = dir.path().join("dump.rdb");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&raw)
        .unwrap();

    let (bytes, entries) = snapshot::load_file(dir.path().to_str().unwrap(), "dump.rdb")
        .unwrap()
        .expect("file exists");
    assert_eq!(&bytes[..], &raw[..]);
    assert_eq!(entries.len(), 1);
    assert_eq!(&entries[0].key[..], b"disk");
}

#[test]
fn test_load_file_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = snapshot::load_file(dir.path().to_str().unwrap(), "absent.rdb").unwrap();
    assert!(loaded.is_none());
}
