//! Index Manager for one collection
//!
//! Indexes are derived, in-memory state. Only their specs are persisted (in
//! the catalog); trees are rebuilt from the collection's documents on open.
//!
//! # API
//!
//! - `create_index(collection, spec, docs)` - Build and register an index
//! - `check_unique(collection, doc_key, doc)` - Reject a write before storage
//! - `apply_write(doc_key, old, new)` - Update indexes after storage write
//! - `apply_delete(doc_key, doc)` - Update indexes after delete
//! - `lookup_eq(field, value)` - Exact match through a single-field index
//! - `scan(index_name, prefix)` - Ordered iteration over one index

use serde_json::Value;

use super::btree::{CompoundKey, DocumentKey, IndexTree};
use super::errors::{IndexError, IndexResult};
use super::spec::{IndexField, IndexSpec, PRIMARY_INDEX_NAME};

/// A registered secondary index
#[derive(Debug)]
struct SecondaryIndex {
    spec: IndexSpec,
    tree: IndexTree,
}

impl SecondaryIndex {
    fn key_of(&self, doc: &Value) -> CompoundKey {
        CompoundKey::for_document(&self.spec, doc)
    }
}

/// Index Manager that maintains the secondary indexes of one collection
#[derive(Debug, Default)]
pub struct IndexManager {
    /// Secondary indexes in creation order
    indexes: Vec<SecondaryIndex>,
}

impl IndexManager {
    /// Creates a manager with no secondary indexes
    pub fn new() -> Self {
        Self {
            indexes: Vec::new(),
        }
    }

    /// Builds an index over `docs` and registers it.
    ///
    /// Returns `Ok(false)` when an identical index already exists.
    ///
    /// # Errors
    ///
    /// - `GPAY_INVALID_INDEX_SPEC` if the spec is unusable
    /// - `GPAY_INDEX_OPTIONS_CONFLICT` if the name or keys are taken by a different index
    /// - `GPAY_DUPLICATE_KEY` if a unique index would hold two documents under one key
    pub fn create_index<'a, I>(
        &mut self,
        collection: &str,
        spec: IndexSpec,
        docs: I,
    ) -> IndexResult<bool>
    where
        I: IntoIterator<Item = (&'a DocumentKey, &'a Value)>,
    {
        spec.validate().map_err(IndexError::invalid_spec)?;

        if let Some(existing) = self.find(&spec.name) {
            if existing.spec == spec {
                return Ok(false);
            }
            return Err(IndexError::options_conflict(
                &spec.name,
                format!("existing definition is {:?}", existing.spec),
            ));
        }
        if let Some(existing) = self.indexes.iter().find(|i| i.spec.keys == spec.keys) {
            return Err(IndexError::options_conflict(
                &spec.name,
                format!("same keys already indexed as '{}'", existing.spec.name),
            ));
        }

        let mut index = SecondaryIndex {
            spec,
            tree: IndexTree::new(),
        };
        for (doc_key, doc) in docs {
            let key = index.key_of(doc);
            index.tree.insert(key, doc_key);
        }

        if index.spec.unique {
            if let Some(dup) = index.tree.first_duplicate() {
                return Err(IndexError::duplicate_key(
                    collection,
                    &index.spec.name,
                    dup.describe(),
                ));
            }
        }

        self.indexes.push(index);
        Ok(true)
    }

    /// Verifies that writing `doc` under `doc_key` keeps every unique index unique.
    ///
    /// Postings that belong to `doc_key` itself are ignored, so replacing a
    /// document with the same key values is allowed.
    pub fn check_unique(&self, collection: &str, doc_key: &str, doc: &Value) -> IndexResult<()> {
        for index in self.indexes.iter().filter(|i| i.spec.unique) {
            let key = index.key_of(doc);
            if index.tree.lookup_eq(&key).iter().any(|k| k != doc_key) {
                return Err(IndexError::duplicate_key(
                    collection,
                    &index.spec.name,
                    key.describe(),
                ));
            }
        }
        Ok(())
    }

    /// Apply a write (insert or replace) to indexes.
    ///
    /// Called AFTER storage write.
    pub fn apply_write(&mut self, doc_key: &str, old: Option<&Value>, new: &Value) {
        for index in &mut self.indexes {
            if let Some(old) = old {
                let old_key = index.key_of(old);
                index.tree.remove(&old_key, doc_key);
            }
            let new_key = index.key_of(new);
            index.tree.insert(new_key, doc_key);
        }
    }

    /// Apply a delete to indexes.
    ///
    /// Called AFTER storage write (tombstone).
    pub fn apply_delete(&mut self, doc_key: &str, doc: &Value) {
        for index in &mut self.indexes {
            let key = index.key_of(doc);
            index.tree.remove(&key, doc_key);
        }
    }

    /// Exact-match lookup through a single-field index on `field`.
    ///
    /// Returns `None` when no such index exists; callers fall back to a scan.
    pub fn lookup_eq(&self, field: &str, value: &Value) -> Option<Vec<DocumentKey>> {
        let index = self
            .indexes
            .iter()
            .find(|i| i.spec.single_field() == Some(field))?;
        let key = CompoundKey::prefix(&index.spec, std::slice::from_ref(value));
        Some(index.tree.lookup_eq(&key).to_vec())
    }

    /// Document keys in index order, restricted to entries whose leading
    /// key fields equal `prefix`.
    pub fn scan(&self, index_name: &str, prefix: &[Value]) -> IndexResult<Vec<DocumentKey>> {
        let index = self
            .find(index_name)
            .ok_or_else(|| IndexError::not_found(index_name))?;
        if prefix.len() > index.spec.keys.len() {
            return Err(IndexError::invalid_spec(format!(
                "prefix of {} values exceeds the {} keys of '{}'",
                prefix.len(),
                index.spec.keys.len(),
                index_name
            )));
        }
        Ok(index.tree.scan_prefix(&CompoundKey::prefix(&index.spec, prefix)))
    }

    /// Secondary index specs in creation order
    pub fn secondary_specs(&self) -> Vec<IndexSpec> {
        self.indexes.iter().map(|i| i.spec.clone()).collect()
    }

    /// All index specs, starting with the implicit primary index
    pub fn specs(&self) -> Vec<IndexSpec> {
        let mut out = vec![primary_spec()];
        out.extend(self.secondary_specs());
        out
    }

    pub fn has_index(&self, index_name: &str) -> bool {
        index_name == PRIMARY_INDEX_NAME || self.find(index_name).is_some()
    }

    /// Number of secondary indexes
    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    fn find(&self, index_name: &str) -> Option<&SecondaryIndex> {
        self.indexes.iter().find(|i| i.spec.name == index_name)
    }
}

/// Spec of the implicit unique `_id` index
pub fn primary_spec() -> IndexSpec {
    IndexSpec::new(vec![IndexField::asc("_id")])
        .named(PRIMARY_INDEX_NAME)
        .unique()
}
