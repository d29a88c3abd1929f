//! Exclusive handle over a data directory
//!
//! Holds an exclusive advisory lock on the `LOCK` file for its lifetime; a
//! second `Server` on the same directory fails with `GPAY_DATA_DIR_LOCKED`.
//! The lock belongs to the open file, so it is released when the handle is
//! dropped or the process dies. A `LOCK` file left behind is not a conflict.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::database::{validate_name, Database};
use super::errors::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event};

const LOCK_FILE_NAME: &str = "LOCK";

pub struct Server {
    data_dir: PathBuf,
    _lock: File,
    databases: BTreeMap<String, Database>,
}

impl Server {
    /// Opens `data_dir`, creating it if needed, and takes the lock.
    pub fn open(data_dir: impl AsRef<Path>) -> DbResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| {
            DbError::catalog(format!("failed to create {}", data_dir.display()), e)
        })?;

        let lock_path = data_dir.join(LOCK_FILE_NAME);
        let mut lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| DbError::catalog("failed to open lock file", e))?;
        match lock.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(DbError::Locked(data_dir)),
            Err(TryLockError::Error(e)) => {
                return Err(DbError::catalog("failed to lock data directory", e));
            }
        }
        lock.set_len(0)
            .and_then(|()| writeln!(lock, "{}", std::process::id()))
            .and_then(|()| lock.sync_all())
            .map_err(|e| DbError::catalog("failed to record lock owner", e))?;

        log_event_with_fields(
            Event::ServerOpened,
            &[("data_dir", &data_dir.display().to_string())],
        );

        Ok(Self {
            data_dir,
            _lock: lock,
            databases: BTreeMap::new(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Opens or creates the database `name` under the data directory.
    pub fn database(&mut self, name: &str) -> DbResult<&mut Database> {
        validate_name("database", name)?;
        match self.databases.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let db = Database::open(&self.data_dir.join(name), name)?;
                Ok(entry.insert(db))
            }
        }
    }

    /// Names of the databases present on disk, sorted
    pub fn database_names(&self) -> DbResult<Vec<String>> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| {
            DbError::catalog(format!("failed to read {}", self.data_dir.display()), e)
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DbError::catalog("failed to read directory entry", e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_name("database", name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.databases.clear();
        log_event_with_fields(
            Event::ServerClosed,
            &[("data_dir", &self.data_dir.display().to_string())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let server = Server::open(temp_dir.path()).unwrap();

        match Server::open(temp_dir.path()) {
            Err(e) => assert_eq!(e.code(), "GPAY_DATA_DIR_LOCKED"),
            Ok(_) => panic!("second handle must not open"),
        }

        drop(server);
        assert!(Server::open(temp_dir.path()).is_ok());
    }

    /// A `LOCK` file from a process that is gone does not block the open.
    #[test]
    fn test_leftover_lock_file_is_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE_NAME);
        fs::write(&lock_path, "999999\n").unwrap();

        let server = Server::open(temp_dir.path()).unwrap();
        let owner = fs::read_to_string(&lock_path).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());

        match Server::open(temp_dir.path()) {
            Err(e) => assert_eq!(e.code(), "GPAY_DATA_DIR_LOCKED"),
            Ok(_) => panic!("live handle must keep the lock"),
        }
        drop(server);
    }

    #[test]
    fn test_database_is_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let mut server = Server::open(temp_dir.path()).unwrap();

        assert_eq!(server.database("gpay_db").unwrap().name(), "gpay_db");
        server.database("gpay_db").unwrap();
        server.database("other").unwrap();
        assert_eq!(server.database_names().unwrap(), vec!["gpay_db", "other"]);

        let err = server.database("bad/name").err().unwrap();
        assert_eq!(err.code(), "GPAY_INVALID_NAME");
    }
}
