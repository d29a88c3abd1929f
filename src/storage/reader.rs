//! Storage reader with strict corruption detection
//!
//! - Every read validates the checksum
//! - Any checksum or framing failure aborts the open

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{DocumentRecord, MIN_RECORD_SIZE};

/// Latest live body per collection and document key
pub type ReplayedDocuments = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Sequential reader over the document file.
pub struct StorageReader {
    storage_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StorageReader {
    /// Opens the record file for a sequential pass.
    pub fn open(storage_path: &Path) -> StorageResult<Self> {
        let file = File::open(storage_path).map_err(|e| {
            StorageError::read_failed(format!("cannot open {}", storage_path.display()), e)
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed(format!("cannot stat {}", storage_path.display()), e))?
            .len();

        Ok(Self {
            storage_path: storage_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::corruption_at_offset(self.current_offset, reason)
    }

    /// Reads the next record, or `None` at a clean end of file.
    ///
    /// A short tail, an impossible length or a checksum mismatch is
    /// `GPAY_DATA_CORRUPTION` at the offset of the damaged record.
    pub fn read_next(&mut self) -> StorageResult<Option<DocumentRecord>> {
        let remaining = self.file_size.saturating_sub(self.current_offset);
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(self.corrupt(format!("{} trailing bytes do not form a record", remaining)));
        }

        let mut len_buf = [0u8; 4];
        if let Err(e) = self.reader.read_exact(&mut len_buf) {
            return Err(self.corrupt(format!("unreadable length prefix: {}", e)));
        }
        let record_length = u32::from_le_bytes(len_buf) as u64;
        if !(MIN_RECORD_SIZE as u64..=remaining).contains(&record_length) {
            return Err(self.corrupt(format!(
                "length prefix {} outside {}..={}",
                record_length, MIN_RECORD_SIZE, remaining
            )));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[..4].copy_from_slice(&len_buf);
        if let Err(e) = self.reader.read_exact(&mut record_buf[4..]) {
            return Err(self.corrupt(format!("unreadable record: {}", e)));
        }

        let (record, consumed) =
            DocumentRecord::deserialize(&record_buf).map_err(|e| self.corrupt(e.to_string()))?;
        self.current_offset += consumed as u64;

        Ok(Some(record))
    }

    /// Reads all remaining records.
    pub fn read_all(&mut self) -> StorageResult<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Resolves the file into its current state.
    ///
    /// The latest record per (collection, key) wins; tombstones remove the
    /// document.
    pub fn replay(&mut self) -> StorageResult<ReplayedDocuments> {
        let mut state = ReplayedDocuments::new();

        while let Some(record) = self.read_next()? {
            let docs = state.entry(record.collection).or_default();
            if record.is_tombstone {
                docs.remove(&record.document_key);
            } else {
                docs.insert(record.document_key, record.body);
            }
        }

        state.retain(|_, docs| !docs.is_empty());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::super::writer::StorageWriter;
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn body(id: &str) -> Vec<u8> {
        format!(r#"{{"_id":"{}"}}"#, id).into_bytes()
    }

    #[test]
    fn test_read_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = StorageWriter::open(temp_dir.path()).unwrap();

        let mut reader = StorageReader::open(writer.path()).unwrap();
        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.replay().unwrap().is_empty());
    }

    #[test]
    fn test_replay_latest_wins_and_tombstones_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();

        writer.write(&DocumentRecord::live("users", "a", body("a"))).unwrap();
        writer.write(&DocumentRecord::live("users", "b", body("b"))).unwrap();
        writer.write(&DocumentRecord::live("users", "a", b"{\"_id\":\"a\",\"v\":2}".to_vec())).unwrap();
        writer.write(&DocumentRecord::tombstone("users", "b")).unwrap();
        writer.write(&DocumentRecord::live("wallets", "a", body("a"))).unwrap();

        let mut reader = StorageReader::open(writer.path()).unwrap();
        let state = reader.replay().unwrap();

        assert_eq!(state["users"].len(), 1);
        assert_eq!(state["users"]["a"], b"{\"_id\":\"a\",\"v\":2}".to_vec());
        assert_eq!(state["wallets"].len(), 1);
    }

    #[test]
    fn test_fully_deleted_collection_dropped_from_replay() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();

        writer.write(&DocumentRecord::live("users", "a", body("a"))).unwrap();
        writer.write(&DocumentRecord::tombstone("users", "a")).unwrap();

        let mut reader = StorageReader::open(writer.path()).unwrap();
        assert!(reader.replay().unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_byte_detected() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        writer.write(&DocumentRecord::live("users", "a", body("a"))).unwrap();
        let path = writer.path().to_path_buf();
        drop(writer);

        let mut bytes = std::fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let err = reader.read_next().unwrap_err();
        assert_eq!(err.code().code(), "GPAY_DATA_CORRUPTION");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_trailing_garbage_detected() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        writer.write(&DocumentRecord::live("users", "a", body("a"))).unwrap();
        let path = writer.path().to_path_buf();
        drop(writer);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x01, 0x02, 0x03]).unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        let err = reader.read_next().unwrap_err();
        assert!(err.details().unwrap().contains("byte_offset"));
    }
}
