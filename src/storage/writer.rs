//! Storage writer with fsync enforcement
//!
//! The document file is append-only. A write is acknowledged only after the
//! record has been synced to disk.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::DocumentRecord;

/// Location of the document file inside a database directory.
pub fn storage_path(db_dir: &Path) -> PathBuf {
    db_dir.join("data").join("documents.dat")
}

/// Append-only writer for `documents.dat`.
///
/// Multiple records for the same document may exist; latest wins on replay.
pub struct StorageWriter {
    storage_path: PathBuf,
    file: File,
    current_offset: u64,
}

impl StorageWriter {
    /// Opens `<db_dir>/data/documents.dat` for appending, creating it and
    /// its directory on first use.
    pub fn open(db_dir: &Path) -> StorageResult<Self> {
        let storage_path = storage_path(db_dir);
        let failed = |what: &str, e| {
            StorageError::write_failed(format!("cannot {} {}", what, storage_path.display()), e)
        };

        if let Some(data_subdir) = storage_path.parent() {
            fs::create_dir_all(data_subdir).map_err(|e| failed("create directory for", e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&storage_path)
            .map_err(|e| failed("open", e))?;
        let current_offset = file.metadata().map_err(|e| failed("stat", e))?.len();

        Ok(Self {
            storage_path,
            file,
            current_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Offset the next record will be written at
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends `record` and fsyncs before returning its offset.
    pub fn write(&mut self, record: &DocumentRecord) -> StorageResult<u64> {
        let bytes = record.serialize();
        let offset = self.current_offset;
        let target = || format!("{}/{}", record.collection, record.document_key);

        self.file
            .write_all(&bytes)
            .map_err(|e| StorageError::write_failed(format!("append of {} failed", target()), e))?;
        self.file
            .sync_all()
            .map_err(|e| StorageError::write_failed(format!("fsync after {} failed", target()), e))?;

        self.current_offset += bytes.len() as u64;
        Ok(offset)
    }

    /// Writes a live document body.
    pub fn write_document(&mut self, collection: &str, document_key: &str, body: Vec<u8>) -> StorageResult<u64> {
        self.write(&DocumentRecord::live(collection, document_key, body))
    }

    /// Writes a tombstone (delete) record.
    pub fn write_tombstone(&mut self, collection: &str, document_key: &str) -> StorageResult<u64> {
        self.write(&DocumentRecord::tombstone(collection, document_key))
    }
}

#[cfg(test)]
mod tests {
    use super::super::reader::StorageReader;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_dir = temp_dir.path().join("gpay_db");

        let writer = StorageWriter::open(&db_dir).unwrap();
        assert!(writer.path().exists());
        assert_eq!(writer.current_offset(), 0);
    }

    #[test]
    fn test_write_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();

        let offset = writer
            .write_document("users", "\"u1\"", br#"{"_id":"u1"}"#.to_vec())
            .unwrap();
        assert_eq!(offset, 0);

        let mut reader = StorageReader::open(writer.path()).unwrap();
        let record = reader.read_next().unwrap().unwrap();
        assert_eq!(record.collection, "users");
        assert_eq!(record.document_key, "\"u1\"");
        assert!(!record.is_tombstone);
    }

    #[test]
    fn test_offset_tracking() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();

        let first = writer.write_document("users", "a", b"{}".to_vec()).unwrap();
        let second = writer.write_tombstone("users", "a").unwrap();

        assert_eq!(first, 0);
        assert!(second > first);
        assert_eq!(
            writer.current_offset(),
            std::fs::metadata(writer.path()).unwrap().len()
        );
    }

    #[test]
    fn test_reopen_appends() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer.write_document("users", "a", b"{}".to_vec()).unwrap();
        }

        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        assert!(writer.current_offset() > 0);
        writer.write_document("users", "b", b"{}".to_vec()).unwrap();

        let mut reader = StorageReader::open(writer.path()).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }
}
