//! In-memory state of one collection
//!
//! Holds the latest version of every live document, keyed by document key,
//! plus the collection's secondary indexes. Storage is written first; this
//! state is updated only after the record is durable.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::index::{DocumentKey, IndexManager, IndexResult, IndexSpec};

#[derive(Debug)]
pub struct Collection {
    name: String,
    schema_version: String,
    documents: BTreeMap<DocumentKey, Value>,
    indexes: IndexManager,
}

impl Collection {
    pub fn new(name: impl Into<String>, schema_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_version: schema_version.into(),
            documents: BTreeMap::new(),
            indexes: IndexManager::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub(crate) fn set_schema_version(&mut self, version: impl Into<String>) {
        self.schema_version = version.into();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.documents.contains_key(key)
    }

    /// Documents in document-key order
    pub fn documents(&self) -> impl Iterator<Item = (&DocumentKey, &Value)> {
        self.documents.iter()
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Builds a secondary index over the current documents.
    pub fn create_index(&mut self, spec: IndexSpec) -> IndexResult<bool> {
        self.indexes.create_index(&self.name, spec, &self.documents)
    }

    /// Loads a replayed document. Indexes are built afterwards.
    pub(crate) fn load(&mut self, key: DocumentKey, doc: Value) {
        self.documents.insert(key, doc);
    }

    /// Records a durable write.
    pub(crate) fn apply_write(&mut self, key: DocumentKey, doc: Value) {
        let old = self.documents.get(&key);
        self.indexes.apply_write(&key, old, &doc);
        self.documents.insert(key, doc);
    }

    /// Records a durable delete. Returns the removed document.
    pub(crate) fn apply_delete(&mut self, key: &str) -> Option<Value> {
        let doc = self.documents.remove(key)?;
        self.indexes.apply_delete(key, &doc);
        Some(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_updates_indexes() {
        let mut coll = Collection::new("users", "v1");
        coll.create_index(IndexSpec::ascending("status")).unwrap();

        coll.apply_write("\"a\"".into(), json!({"_id": "a", "status": "ACTIVE"}));
        coll.apply_write("\"a\"".into(), json!({"_id": "a", "status": "INACTIVE"}));

        assert_eq!(coll.len(), 1);
        assert!(coll.indexes().lookup_eq("status", &json!("ACTIVE")).unwrap().is_empty());
        assert_eq!(
            coll.indexes().lookup_eq("status", &json!("INACTIVE")).unwrap(),
            vec!["\"a\""]
        );

        let removed = coll.apply_delete("\"a\"").unwrap();
        assert_eq!(removed["status"], "INACTIVE");
        assert!(coll.is_empty());
        assert!(coll.apply_delete("\"a\"").is_none());
    }

    #[test]
    fn test_index_built_over_loaded_documents() {
        let mut coll = Collection::new("wallets", "v1");
        coll.load("\"w1\"".into(), json!({"_id": "w1", "userId": "u1"}));
        coll.load("\"w2\"".into(), json!({"_id": "w2", "userId": "u1"}));

        let err = coll
            .create_index(IndexSpec::ascending("userId").unique())
            .unwrap_err();
        assert_eq!(err.code().code(), "GPAY_DUPLICATE_KEY");
    }
}
