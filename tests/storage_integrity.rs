//! Storage Integrity Tests
//!
//! - Data corruption is never ignored
//! - Checksums on every record
//! - Latest record per document wins on replay; tombstones delete
//! - A database whose record file is damaged refuses to open

use gpaydb::db::Database;
use gpaydb::storage::{storage_path, DocumentRecord, StorageReader, StorageWriter};
use serde_json::json;
use std::fs;
use std::io::Write;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn body(id: &str, label: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({ "_id": id, "label": label })).unwrap()
}

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

// =============================================================================
// Corruption Is Never Ignored
// =============================================================================

/// A flipped byte in the middle of a record fails the read.
#[test]
fn test_corruption_causes_explicit_failure() {
    let temp_dir = create_temp_data_dir();
    let data_dir = temp_dir.path();
    let path = storage_path(data_dir);

    {
        let mut writer = StorageWriter::open(data_dir).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "first")).unwrap();
    }

    let mut contents = fs::read(&path).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let mut reader = StorageReader::open(&path).unwrap();
    let err = reader.read_next().unwrap_err();
    assert_eq!(err.code().code(), "GPAY_DATA_CORRUPTION");
    assert!(err.is_fatal());
}

/// A half-written tail is reported, not skipped.
#[test]
fn test_truncated_tail_detected() {
    let temp_dir = create_temp_data_dir();
    let data_dir = temp_dir.path();
    let path = storage_path(data_dir);

    {
        let mut writer = StorageWriter::open(data_dir).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "first")).unwrap();
        writer.write_document("users", "\"u2\"", body("u2", "second")).unwrap();
    }

    let contents = fs::read(&path).unwrap();
    fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    let mut reader = StorageReader::open(&path).unwrap();
    assert!(reader.read_next().unwrap().is_some());
    let err = reader.read_next().unwrap_err();
    assert!(err.to_string().contains("GPAY_DATA_CORRUPTION"));
}

/// Garbage appended after valid records fails the replay.
#[test]
fn test_garbage_tail_fails_replay() {
    let temp_dir = create_temp_data_dir();
    let data_dir = temp_dir.path();
    let path = storage_path(data_dir);

    {
        let mut writer = StorageWriter::open(data_dir).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "first")).unwrap();
    }
    {
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xAB; 40]).unwrap();
    }

    let mut reader = StorageReader::open(&path).unwrap();
    assert!(reader.replay().is_err());
}

// =============================================================================
// Checksums On Every Record
// =============================================================================

/// Every serialized record carries a checksum that the reader verifies.
#[test]
fn test_every_record_is_checksummed() {
    let records = vec![
        DocumentRecord::live("users", "\"a\"", body("a", "x")),
        DocumentRecord::tombstone("users", "\"a\""),
        DocumentRecord::live("wallets", "{\"$oid\":\"w\"}", Vec::new()),
    ];

    for record in records {
        let mut bytes = record.serialize();
        assert!(DocumentRecord::deserialize(&bytes).is_ok());

        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(DocumentRecord::deserialize(&bytes).is_err());
    }
}

// =============================================================================
// Replay Semantics
// =============================================================================

/// Latest record wins and tombstones remove the document.
#[test]
fn test_replay_latest_wins() {
    let temp_dir = create_temp_data_dir();
    let data_dir = temp_dir.path();

    {
        let mut writer = StorageWriter::open(data_dir).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "v1")).unwrap();
        writer.write_document("users", "\"u2\"", body("u2", "v1")).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "v2")).unwrap();
        writer.write_tombstone("users", "\"u2\"").unwrap();
        writer.write_document("wallets", "\"w1\"", body("w1", "v1")).unwrap();
        writer.write_tombstone("wallets", "\"w1\"").unwrap();
    }

    let mut reader = StorageReader::open(&storage_path(data_dir)).unwrap();
    let state = reader.replay().unwrap();

    assert_eq!(state.len(), 1);
    let users = &state["users"];
    assert_eq!(users.len(), 1);
    let doc: serde_json::Value = serde_json::from_slice(&users["\"u1\""]).unwrap();
    assert_eq!(doc["label"], "v2");
}

/// Reopening the writer appends after existing records.
#[test]
fn test_writer_reopen_appends() {
    let temp_dir = create_temp_data_dir();
    let data_dir = temp_dir.path();

    let first_end = {
        let mut writer = StorageWriter::open(data_dir).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "a")).unwrap();
        writer.current_offset()
    };

    let mut writer = StorageWriter::open(data_dir).unwrap();
    assert_eq!(writer.current_offset(), first_end);
    let offset = writer.write_document("users", "\"u2\"", body("u2", "b")).unwrap();
    assert_eq!(offset, first_end);

    let mut reader = StorageReader::open(&storage_path(data_dir)).unwrap();
    assert_eq!(reader.read_all().unwrap().len(), 2);
}

// =============================================================================
// Database Open
// =============================================================================

/// A damaged record file makes the database refuse to open.
#[test]
fn test_database_open_fails_on_corruption() {
    let temp_dir = create_temp_data_dir();
    let db_dir = temp_dir.path().join("gpay_db");

    {
        let mut writer = StorageWriter::open(&db_dir).unwrap();
        writer.write_document("users", "\"u1\"", body("u1", "a")).unwrap();
    }
    let path = storage_path(&db_dir);
    let mut contents = fs::read(&path).unwrap();
    contents[6] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = Database::open(&db_dir, "gpay_db").err().unwrap();
    assert_eq!(err.code(), "GPAY_DATA_CORRUPTION");
}

/// Records for a collection the catalog does not know are corruption.
#[test]
fn test_database_open_rejects_unknown_collection() {
    let temp_dir = create_temp_data_dir();
    let db_dir = temp_dir.path().join("gpay_db");

    {
        let mut writer = StorageWriter::open(&db_dir).unwrap();
        writer.write_document("ghosts", "\"g1\"", body("g1", "boo")).unwrap();
    }

    let err = Database::open(&db_dir, "gpay_db").err().unwrap();
    assert_eq!(err.code(), "GPAY_DATA_CORRUPTION");
    assert!(err.to_string().contains("ghosts"));
}
