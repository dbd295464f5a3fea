//! Tests for the log Reader
//!
//! These tests verify:
//! - Reading entries from a log file
//! - Iterator functionality
//! - Torn tail vs mid-file corruption
//! - Empty and missing file handling

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use ledgerkv::wal::{Operation, ReadEvent, WalEntry, WalReader};
use ledgerkv::LedgerError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn write_entries_to_wal(path: &PathBuf, entries: &[WalEntry]) {
    let mut file = File::create(path).unwrap();
    for entry in entries {
        let bytes = entry.serialize().unwrap();
        file.write_all(&bytes).unwrap();
    }
    file.sync_all().unwrap();
}

fn set(lsn: u64, key: &str, value: &str) -> WalEntry {
    WalEntry::new(
        lsn,
        Operation::Set {
            key: key.as_bytes().to_vec(),
            value: value.as_bytes().to_vec(),
        },
    )
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::End));
}

#[test]
fn test_missing_file_reads_as_empty() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::End));
}

#[test]
fn test_read_multiple_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let entries = vec![
        set(1, "k1", "v1"),
        set(2, "k2", "v2"),
        WalEntry::new(3, Operation::Delete { key: b"k1".to_vec() }),
        set(4, "k3", "v3"),
    ];
    write_entries_to_wal(&wal_path, &entries);

    let mut reader = WalReader::open(&wal_path).unwrap();
    for expected in &entries {
        match reader.next_entry().unwrap() {
            ReadEvent::Entry(entry) => assert_eq!(&entry, expected),
            other => panic!("Expected entry, got {:?}", other),
        }
    }
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::End));
    // Stays at the end
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::End));
}

#[test]
fn test_iterator_collects_all_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let entries: Vec<WalEntry> = (1..=10)
        .map(|i| set(i, &format!("key{}", i), &format!("value{}", i)))
        .collect();
    write_entries_to_wal(&wal_path, &entries);

    let reader = WalReader::open(&wal_path).unwrap();
    let read: Vec<WalEntry> = reader.entries().collect::<Result<Vec<_>, _>>().unwrap();

    assert_eq!(read, entries);
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

#[test]
fn test_partial_header_is_torn_tail() {
    let first = set(1, "k", "v");
    let first_len = first.serialize().unwrap().len() as u64;

    let mut bytes = first.serialize().unwrap();
    bytes.extend_from_slice(&[0u8; 7]);

    let mut reader = WalReader::from_bytes(bytes);
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::Entry(_)));
    match reader.next_entry().unwrap() {
        ReadEvent::TornTail { offset, corrupted } => {
            assert_eq!(offset, first_len);
            assert!(!corrupted);
        }
        other => panic!("Expected torn tail, got {:?}", other),
    }
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::End));
}

#[test]
fn test_bad_checksum_on_last_frame_is_torn_tail() {
    let mut bytes = set(1, "a", "1").serialize().unwrap();
    let mut last = set(2, "b", "2").serialize().unwrap();
    if let Some(byte) = last.last_mut() {
        *byte ^= 0xFF;
    }
    bytes.extend(last);

    let mut reader = WalReader::from_bytes(bytes);
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::Entry(_)));
    assert!(matches!(
        reader.next_entry().unwrap(),
        ReadEvent::TornTail { corrupted: true, .. }
    ));
}

#[test]
fn test_iterator_stops_at_torn_tail() {
    let mut bytes = set(1, "a", "1").serialize().unwrap();
    let partial = set(2, "b", "2").serialize().unwrap();
    bytes.extend_from_slice(&partial[..partial.len() - 3]);

    let reader = WalReader::from_bytes(bytes);
    let read: Vec<WalEntry> = reader.entries().collect::<Result<Vec<_>, _>>().unwrap();

    assert_eq!(read, vec![set(1, "a", "1")]);
}

// =============================================================================
// Mid-File Corruption Tests
// =============================================================================

#[test]
fn test_corrupt_frame_followed_by_data_is_fatal() {
    let mut middle = set(2, "b", "2").serialize().unwrap();
    if let Some(byte) = middle.last_mut() {
        *byte ^= 0xFF;
    }

    let mut bytes = set(1, "a", "1").serialize().unwrap();
    bytes.extend(middle);
    bytes.extend(set(3, "c", "3").serialize().unwrap());

    let mut reader = WalReader::from_bytes(bytes);
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::Entry(_)));
    assert!(matches!(
        reader.next_entry(),
        Err(LedgerError::CorruptLog(_))
    ));
}

#[test]
fn test_out_of_order_lsn_is_fatal() {
    let mut bytes = set(5, "a", "1").serialize().unwrap();
    bytes.extend(set(5, "b", "2").serialize().unwrap());
    bytes.extend(set(6, "c", "3").serialize().unwrap());

    let results: Vec<_> = WalReader::from_bytes(bytes).entries().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(LedgerError::CorruptLog(_))));
}

#[test]
fn test_corrupted_length_mid_file_is_fatal() {
    let mut first = set(1, "a", "1").serialize().unwrap();
    first[15] ^= 0x80;

    let mut bytes = first;
    bytes.extend(set(2, "b", "2").serialize().unwrap());
    bytes.extend(set(3, "c", "3").serialize().unwrap());

    let mut reader = WalReader::from_bytes(bytes);
    assert!(matches!(
        reader.next_entry(),
        Err(LedgerError::CorruptLog(_))
    ));
}

// =============================================================================
// Tail Garbage Tests
// =============================================================================

#[test]
fn test_zero_filled_tail_is_torn() {
    let first = set(1, "k", "v");
    let first_len = first.serialize().unwrap().len() as u64;

    let mut bytes = first.serialize().unwrap();
    bytes.extend_from_slice(&[0u8; 40]);

    let mut reader = WalReader::from_bytes(bytes);
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::Entry(_)));
    match reader.next_entry().unwrap() {
        ReadEvent::TornTail { offset, corrupted } => {
            assert_eq!(offset, first_len);
            assert!(corrupted);
        }
        other => panic!("Expected torn tail, got {:?}", other),
    }
}

#[test]
fn test_zero_filled_log_is_torn_at_start() {
    let mut reader = WalReader::from_bytes(vec![0u8; 64]);
    assert!(matches!(
        reader.next_entry().unwrap(),
        ReadEvent::TornTail { offset: 0, corrupted: true }
    ));
}

#[test]
fn test_regressing_lsn_on_last_frame_is_torn() {
    let mut bytes = set(4, "a", "1").serialize().unwrap();
    bytes.extend(set(2, "b", "2").serialize().unwrap());

    let mut reader = WalReader::from_bytes(bytes);
    assert!(matches!(reader.next_entry().unwrap(), ReadEvent::Entry(_)));
    assert!(matches!(
        reader.next_entry().unwrap(),
        ReadEvent::TornTail { corrupted: true, .. }
    ));
}

#[test]
fn test_zero_lsn_as_only_frame_is_torn() {
    let bytes = set(0, "a", "1").serialize().unwrap();

    let read: Vec<WalEntry> = WalReader::from_bytes(bytes)
        .entries()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(read.is_empty());
}
