//! Per-database catalog
//!
//! `<db_dir>/metadata/catalog.json` records, for every collection, the
//! active schema version and the secondary index specs. Document contents
//! live in the record file; index trees are rebuilt from it on open.
//!
//! The catalog is rewritten whole on every change:
//! 1. Write to `catalog.json.tmp`
//! 2. fsync the temp file
//! 3. Rename over `catalog.json`

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{DbError, DbResult};
use crate::index::IndexSpec;

const CATALOG_FILE_NAME: &str = "catalog.json";

/// Catalog entry for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub schema_version: String,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionEntry>,
}

impl Catalog {
    pub fn path(db_dir: &Path) -> PathBuf {
        db_dir.join("metadata").join(CATALOG_FILE_NAME)
    }

    /// Reads the catalog, or returns an empty one for a new database.
    pub fn load(db_dir: &Path) -> DbResult<Self> {
        let path = Self::path(db_dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| DbError::catalog(format!("failed to read {}", path.display()), e))?;

        serde_json::from_str(&content).map_err(|e| {
            DbError::catalog_invalid(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Writes the catalog atomically.
    pub fn save(&self, db_dir: &Path) -> DbResult<()> {
        let path = Self::path(db_dir);
        let temp_path = path.with_extension("json.tmp");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DbError::catalog(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DbError::catalog_invalid(format!("failed to serialize catalog: {}", e)))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| DbError::catalog("failed to create temp catalog file", e))?;

        file.write_all(content.as_bytes())
            .map_err(|e| DbError::catalog("failed to write catalog", e))?;
        file.sync_all()
            .map_err(|e| DbError::catalog("failed to fsync catalog", e))?;

        fs::rename(&temp_path, &path)
            .map_err(|e| DbError::catalog("failed to commit catalog", e))?;

        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    pub fn entry(&self, collection: &str) -> Option<&CollectionEntry> {
        self.collections.get(collection)
    }

    pub fn entry_mut(&mut self, collection: &str) -> Option<&mut CollectionEntry> {
        self.collections.get_mut(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_catalog_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = Catalog::load(temp_dir.path()).unwrap();
        assert!(catalog.collections.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut catalog = Catalog::default();
        catalog.collections.insert(
            "wallets".into(),
            CollectionEntry {
                schema_version: "v1".into(),
                indexes: vec![IndexSpec::ascending("userId").unique()],
            },
        );
        catalog.save(temp_dir.path()).unwrap();

        let loaded = Catalog::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, catalog);
        assert!(!Catalog::path(temp_dir.path()).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_garbage_catalog_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = Catalog::path(temp_dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = Catalog::load(temp_dir.path()).unwrap_err();
        assert_eq!(err.code(), "GPAY_CATALOG_ERROR");
    }
}
