//! One logical database: schemas, catalog, record file and collections
//!
//! # Open sequence (strict order)
//!
//! 1. Load schemas from `metadata/schemas`
//! 2. Load the catalog
//! 3. Open the record file for appending
//! 4. Replay the record file into per-collection state
//! 5. Rebuild every index from the replayed documents
//!
//! # Write path
//!
//! 1. Assign `_id` if missing
//! 2. Validate against the active schema
//! 3. Check the primary key and every unique index
//! 4. Append the record (fsync)
//! 5. Apply to collection state and indexes
//!
//! A write rejected in steps 2-3 leaves no trace on disk or in memory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::catalog::{Catalog, CollectionEntry};
use super::collection::Collection;
use super::errors::{DbError, DbResult};
use crate::index::{IndexError, IndexKey, IndexSpec, PRIMARY_INDEX_NAME};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot};
use crate::schema::{Schema, SchemaError, SchemaRegistry, SchemaValidator};
use crate::storage::{storage_path, StorageError, StorageReader, StorageWriter};
use crate::value;

const MAX_NAME_LEN: usize = 64;

/// Database and collection names: `[A-Za-z0-9_-]{1,64}`
pub(crate) fn validate_name(kind: &'static str, name: &str) -> DbResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Summary of one collection for `stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub name: String,
    pub schema_version: String,
    pub documents: usize,
    pub indexes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub name: String,
    pub collections: Vec<CollectionStats>,
    pub metrics: MetricsSnapshot,
}

pub struct Database {
    name: String,
    dir: PathBuf,
    registry: SchemaRegistry,
    catalog: Catalog,
    collections: BTreeMap<String, Collection>,
    writer: StorageWriter,
    metrics: MetricsRegistry,
}

impl Database {
    /// Opens the database stored in `dir`, creating it if absent.
    ///
    /// # Errors
    ///
    /// - `GPAY_DATA_CORRUPTION` if the record file fails checksum or framing,
    ///   or holds documents of a collection the catalog does not know
    /// - `GPAY_MALFORMED_SCHEMA` / `GPAY_CATALOG_ERROR` for bad metadata
    pub fn open(dir: &Path, name: &str) -> DbResult<Self> {
        validate_name("database", name)?;

        match Self::open_inner(dir, name) {
            Ok(db) => Ok(db),
            Err(DbError::Storage(e)) if e.is_fatal() => {
                log_event_with_fields(
                    Event::DataCorruption,
                    &[
                        ("database", name),
                        ("details", e.details().unwrap_or("")),
                        ("reason", e.message()),
                    ],
                );
                Err(DbError::Storage(e))
            }
            Err(e) => Err(e),
        }
    }

    fn open_inner(dir: &Path, name: &str) -> DbResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            DbError::catalog(format!("failed to create {}", dir.display()), e)
        })?;

        // 1. Schemas
        let mut registry = SchemaRegistry::new(dir);
        registry.load_all()?;
        let schema_count = registry.schema_count().to_string();
        log_event_with_fields(
            Event::SchemasLoaded,
            &[("database", name), ("schemas", &schema_count)],
        );

        // 2. Catalog
        let catalog = Catalog::load(dir)?;

        // 3. Record file
        let writer = StorageWriter::open(dir)?;

        // 4. Replay
        let mut reader = StorageReader::open(&storage_path(dir))?;
        let replayed = reader.replay()?;

        let mut collections = BTreeMap::new();
        for (coll_name, entry) in &catalog.collections {
            if !registry.exists(coll_name, &entry.schema_version) {
                return Err(SchemaError::unknown_version(coll_name, &entry.schema_version).into());
            }
            collections.insert(
                coll_name.clone(),
                Collection::new(coll_name.as_str(), entry.schema_version.as_str()),
            );
        }

        let mut document_count = 0usize;
        for (coll_name, docs) in replayed {
            let Some(collection) = collections.get_mut(&coll_name) else {
                let first_key = docs.keys().next().cloned().unwrap_or_default();
                return Err(StorageError::corruption_for_document(
                    &coll_name,
                    &first_key,
                    "collection missing from catalog",
                )
                .into());
            };
            for (key, body) in docs {
                let doc: Value = serde_json::from_slice(&body).map_err(|e| {
                    StorageError::corruption_for_document(
                        &coll_name,
                        &key,
                        format!("record body is not valid JSON: {}", e),
                    )
                })?;
                collection.load(key, doc);
                document_count += 1;
            }
        }
        let document_count = document_count.to_string();
        let offset = writer.current_offset().to_string();
        log_event_with_fields(
            Event::StorageReplayed,
            &[("bytes", &offset), ("database", name), ("documents", &document_count)],
        );

        // 5. Indexes
        let mut index_count = 0usize;
        for (coll_name, entry) in &catalog.collections {
            if let Some(collection) = collections.get_mut(coll_name) {
                for spec in &entry.indexes {
                    collection.create_index(spec.clone())?;
                    index_count += 1;
                }
            }
        }
        let index_count = index_count.to_string();
        log_event_with_fields(
            Event::IndexesRebuilt,
            &[("database", name), ("indexes", &index_count)],
        );

        let collection_count = collections.len().to_string();
        log_event_with_fields(
            Event::DatabaseOpened,
            &[("collections", &collection_count), ("database", name)],
        );

        Ok(Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            registry,
            catalog,
            collections,
            writer,
            metrics: MetricsRegistry::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    // ==================
    // Collections
    // ==================

    /// Creates a collection governed by `schema`. The collection is named
    /// after `schema.schema_id`.
    pub fn create_collection(&mut self, schema: Schema) -> DbResult<()> {
        let name = schema.schema_id.clone();
        validate_name("collection", &name)?;
        if self.collections.contains_key(&name) {
            return Err(DbError::CollectionExists(name));
        }

        let version = schema.schema_version.clone();
        self.registry.register_and_save(schema)?;

        self.catalog.collections.insert(
            name.clone(),
            CollectionEntry {
                schema_version: version.clone(),
                indexes: Vec::new(),
            },
        );
        self.catalog.save(&self.dir)?;
        self.collections
            .insert(name.clone(), Collection::new(name.as_str(), version.as_str()));

        self.metrics.increment_collections_created();
        log_event_with_fields(
            Event::CollectionCreated,
            &[
                ("collection", &name),
                ("database", &self.name),
                ("schema_version", &version),
            ],
        );
        Ok(())
    }

    /// Collection names in sorted order
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Active schema of a collection
    pub fn schema(&self, collection: &str) -> DbResult<&Schema> {
        let coll = self.collection(collection)?;
        self.registry
            .get(collection, coll.schema_version())
            .ok_or_else(|| SchemaError::unknown_version(collection, coll.schema_version()).into())
    }

    /// Makes `schema` the active schema of its collection.
    ///
    /// Returns `Ok(false)` if it is already active. A new version is only
    /// accepted once every stored document validates against it; the same
    /// version with a different definition is `GPAY_SCHEMA_IMMUTABLE`.
    pub fn set_schema(&mut self, schema: Schema) -> DbResult<bool> {
        let name = schema.schema_id.clone();
        let version = schema.schema_version.clone();
        let current = self.collection(&name)?.schema_version().to_string();

        if current == version {
            return match self.registry.get(&name, &version) {
                Some(existing) if *existing == schema => Ok(false),
                _ => Err(SchemaError::schema_immutable(&name, &version).into()),
            };
        }

        let mut staging = SchemaRegistry::new(&self.dir);
        staging.register(schema.clone())?;
        {
            let validator = SchemaValidator::new(&staging);
            let coll = self.collection(&name)?;
            for (_, doc) in coll.documents() {
                validator.validate_document(&name, &version, doc)?;
            }
        }

        self.registry.register_and_save(schema)?;
        if let Some(entry) = self.catalog.entry_mut(&name) {
            entry.schema_version = version.clone();
        }
        self.catalog.save(&self.dir)?;
        self.collection_mut(&name)?.set_schema_version(version.as_str());

        log_event_with_fields(
            Event::SchemaUpgraded,
            &[
                ("collection", &name),
                ("from_version", &current),
                ("to_version", &version),
            ],
        );
        Ok(true)
    }

    // ==================
    // Indexes
    // ==================

    /// Builds a secondary index. Returns `Ok(false)` if an identical index
    /// already exists.
    pub fn create_index(&mut self, collection: &str, spec: IndexSpec) -> DbResult<bool> {
        let coll = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;

        if !coll.create_index(spec.clone())? {
            return Ok(false);
        }

        if let Some(entry) = self.catalog.entry_mut(collection) {
            entry.indexes.push(spec.clone());
        }
        self.catalog.save(&self.dir)?;

        self.metrics.increment_indexes_created();
        let unique = spec.unique.to_string();
        log_event_with_fields(
            Event::IndexCreated,
            &[
                ("collection", collection),
                ("index", &spec.name),
                ("unique", &unique),
            ],
        );
        Ok(true)
    }

    /// All indexes of a collection, `_id_` first
    pub fn list_indexes(&self, collection: &str) -> DbResult<Vec<IndexSpec>> {
        Ok(self.collection(collection)?.indexes().specs())
    }

    // ==================
    // Writes
    // ==================

    /// Validates and stores one document. Returns its `_id`.
    pub fn insert_one(&mut self, collection: &str, doc: Value) -> DbResult<Value> {
        let result = self.insert_inner(collection, doc);
        if let Err(ref e) = result {
            self.record_rejection(collection, e);
        }
        result
    }

    /// Ordered insert: stops at the first failure. Documents before it stay.
    pub fn insert_many<I>(&mut self, collection: &str, docs: I) -> DbResult<Vec<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut ids = Vec::new();
        for doc in docs {
            ids.push(self.insert_one(collection, doc)?);
        }
        Ok(ids)
    }

    fn insert_inner(&mut self, collection: &str, mut doc: Value) -> DbResult<Value> {
        let coll = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;

        if let Some(obj) = doc.as_object_mut() {
            let id = match obj.get("_id") {
                Some(id) => value::canonical_id(id),
                None => value::new_object_id(),
            };
            obj.insert("_id".to_string(), id);
        }

        SchemaValidator::new(&self.registry).validate_document(
            collection,
            coll.schema_version(),
            &doc,
        )?;

        let id = doc.get("_id").cloned().unwrap_or(Value::Null);
        let key = value::document_key(&id);
        if coll.contains(&key) {
            return Err(IndexError::duplicate_key(collection, PRIMARY_INDEX_NAME, &key).into());
        }
        coll.indexes().check_unique(collection, &key, &doc)?;

        let body = serde_json::to_vec(&doc).map_err(|e| {
            StorageError::write_failed(
                format!("failed to encode document {}", key),
                io::Error::from(e),
            )
        })?;
        let offset = self.writer.write_document(collection, &key, body)?;
        let written = self.writer.current_offset() - offset;

        coll.apply_write(key.clone(), doc);

        self.metrics.increment_documents_inserted();
        self.metrics.add_bytes_written(written);
        log_event_with_fields(
            Event::DocumentInserted,
            &[("collection", collection), ("document", &key)],
        );
        Ok(id)
    }

    /// Deletes the document with `_id == id`. Returns whether it existed.
    pub fn delete_one(&mut self, collection: &str, id: &Value) -> DbResult<bool> {
        let key = value::document_key(id);
        let coll = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;
        if !coll.contains(&key) {
            return Ok(false);
        }

        let offset = self.writer.write_tombstone(collection, &key)?;
        let written = self.writer.current_offset() - offset;
        coll.apply_delete(&key);

        self.metrics.increment_documents_deleted();
        self.metrics.add_bytes_written(written);
        log_event_with_fields(
            Event::DocumentDeleted,
            &[("collection", collection), ("document", &key)],
        );
        Ok(true)
    }

    fn record_rejection(&self, collection: &str, err: &DbError) {
        if err.is_rejection() {
            self.metrics.increment_writes_rejected();
            let message = err.to_string();
            log_event_with_fields(
                Event::WriteRejected,
                &[
                    ("code", err.code()),
                    ("collection", collection),
                    ("message", &message),
                ],
            );
        }
    }

    // ==================
    // Reads
    // ==================

    /// Document with `_id == id`
    pub fn get(&self, collection: &str, id: &Value) -> DbResult<Option<&Value>> {
        Ok(self.collection(collection)?.get(&value::document_key(id)))
    }

    /// First document whose `field` equals `value`
    pub fn find_one(&self, collection: &str, field: &str, value: &Value) -> DbResult<Option<&Value>> {
        Ok(self.find_eq(collection, field, value)?.into_iter().next())
    }

    /// All documents whose `field` equals `value`, in document-key order.
    ///
    /// Served by a single-field index when one exists, otherwise by a scan.
    /// Equality follows index key semantics: `1` equals `1.0`, and a missing
    /// field equals `null`.
    pub fn find_eq(&self, collection: &str, field: &str, value: &Value) -> DbResult<Vec<&Value>> {
        let coll = self.collection(collection)?;

        if field == "_id" {
            return Ok(coll.get(&value::document_key(value)).into_iter().collect());
        }

        if let Some(keys) = coll.indexes().lookup_eq(field, value) {
            return Ok(keys.iter().filter_map(|k| coll.get(k)).collect());
        }

        let wanted = IndexKey::from_json(value);
        Ok(coll
            .documents()
            .filter(|(_, doc)| IndexKey::from_field(doc.get(field)) == wanted)
            .map(|(_, doc)| doc)
            .collect())
    }

    /// Documents in the order of `index_name`, restricted to entries whose
    /// leading key values equal `prefix`.
    pub fn find_by_index(
        &self,
        collection: &str,
        index_name: &str,
        prefix: &[Value],
    ) -> DbResult<Vec<&Value>> {
        let coll = self.collection(collection)?;

        if index_name == PRIMARY_INDEX_NAME {
            if prefix.len() > 1 {
                return Err(IndexError::invalid_spec(format!(
                    "prefix of {} values exceeds the 1 key of '{}'",
                    prefix.len(),
                    PRIMARY_INDEX_NAME
                ))
                .into());
            }
            let wanted = prefix.first().map(IndexKey::from_json);
            let mut docs: Vec<(IndexKey, &Value)> = coll
                .documents()
                .map(|(_, doc)| (IndexKey::from_field(doc.get("_id")), doc))
                .filter(|(k, _)| wanted.as_ref().map_or(true, |w| w == k))
                .collect();
            docs.sort_by(|a, b| a.0.cmp(&b.0));
            return Ok(docs.into_iter().map(|(_, doc)| doc).collect());
        }

        let keys = coll.indexes().scan(index_name, prefix)?;
        Ok(keys.iter().filter_map(|k| coll.get(k)).collect())
    }

    pub fn count(&self, collection: &str) -> DbResult<usize> {
        Ok(self.collection(collection)?.len())
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            name: self.name.clone(),
            collections: self
                .collections
                .values()
                .map(|c| CollectionStats {
                    name: c.name().to_string(),
                    schema_version: c.schema_version().to_string(),
                    documents: c.len(),
                    indexes: c.indexes().specs().into_iter().map(|s| s.name).collect(),
                })
                .collect(),
            metrics: self.metrics.snapshot(),
        }
    }

    fn collection(&self, name: &str) -> DbResult<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| DbError::CollectionNotFound(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> DbResult<&mut Collection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| DbError::CollectionNotFound(name.to_string()))
    }
}
