//! BTreeMap-based index structures
//!
//! Indexes use BTreeMap<CompoundKey, Vec<DocumentKey>> for deterministic ordering.
//! Document keys under one index key are always sorted ascending.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use super::spec::{Direction, IndexSpec};
use crate::value;

/// Index key representing one field value.
///
/// Ordering is deterministic and follows type order first:
/// Null < Number < String < Document < ObjectId < Bool < Date.
/// Numbers compare by exact decimal value, so `1` and `1.0` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Missing field or explicit null
    Null,
    /// Integer, float or decimal
    Number(Decimal),
    /// String value
    String(String),
    /// Arrays and plain objects, keyed by their canonical JSON text
    Document(String),
    /// `$oid` value
    ObjectId(Uuid),
    /// Boolean value (false < true)
    Bool(bool),
    /// `$date` value in milliseconds since the epoch
    Date(i64),
}

impl IndexKey {
    /// Create a key from a JSON value
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => match value::as_decimal(v) {
                Some(d) => IndexKey::Number(d),
                // Out of decimal range; still a stable key
                None => IndexKey::Document(n.to_string()),
            },
            Value::String(s) => IndexKey::String(s.clone()),
            Value::Array(_) => IndexKey::Document(v.to_string()),
            Value::Object(obj) => {
                if let Some(ts) = value::as_date(v) {
                    IndexKey::Date(ts.timestamp_millis())
                } else if let Some(id) = value::as_object_id(v) {
                    IndexKey::ObjectId(id)
                } else if obj.contains_key(value::DECIMAL_KEY) {
                    match value::as_decimal(v) {
                        Some(d) => IndexKey::Number(d),
                        None => IndexKey::Document(v.to_string()),
                    }
                } else {
                    IndexKey::Document(v.to_string())
                }
            }
        }
    }

    /// Key for a possibly missing field
    pub fn from_field(v: Option<&Value>) -> Self {
        v.map(Self::from_json).unwrap_or(IndexKey::Null)
    }
}

/// One key part with its direction applied.
///
/// All parts at a given position of one index share a direction, so the
/// derived ordering never compares `Asc` against `Desc`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Asc(IndexKey),
    Desc(Reverse<IndexKey>),
}

impl KeyPart {
    pub fn new(key: IndexKey, direction: Direction) -> Self {
        match direction {
            Direction::Asc => KeyPart::Asc(key),
            Direction::Desc => KeyPart::Desc(Reverse(key)),
        }
    }

    pub fn key(&self) -> &IndexKey {
        match self {
            KeyPart::Asc(k) => k,
            KeyPart::Desc(Reverse(k)) => k,
        }
    }
}

/// Full key of one index entry, in index key order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompoundKey(pub Vec<KeyPart>);

impl CompoundKey {
    /// Extracts the key of `doc` for `spec`. Missing fields become Null.
    pub fn for_document(spec: &IndexSpec, doc: &Value) -> Self {
        CompoundKey(
            spec.keys
                .iter()
                .map(|k| KeyPart::new(IndexKey::from_field(doc.get(&k.field)), k.direction))
                .collect(),
        )
    }

    /// Builds a key prefix from leading field values.
    pub fn prefix(spec: &IndexSpec, values: &[Value]) -> Self {
        CompoundKey(
            spec.keys
                .iter()
                .zip(values)
                .map(|(k, v)| KeyPart::new(IndexKey::from_json(v), k.direction))
                .collect(),
        )
    }

    pub fn starts_with(&self, prefix: &CompoundKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Human-readable rendering for error messages
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(|p| format!("{:?}", p.key())).collect();
        format!("[{}]", parts.join(", "))
    }
}

/// Primary-key text of a document
pub type DocumentKey = String;

/// A single index using BTreeMap for deterministic ordering.
#[derive(Debug, Default)]
pub struct IndexTree {
    /// Maps keys to sorted lists of document keys
    tree: BTreeMap<CompoundKey, Vec<DocumentKey>>,
}

impl IndexTree {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert a document key under `key`.
    ///
    /// Maintains sorted ascending order.
    pub fn insert(&mut self, key: CompoundKey, doc_key: &str) {
        let postings = self.tree.entry(key).or_default();

        match postings.binary_search_by(|p| p.as_str().cmp(doc_key)) {
            Ok(_) => {} // Already exists
            Err(pos) => postings.insert(pos, doc_key.to_string()),
        }
    }

    /// Remove a document key from `key`.
    ///
    /// If the key has no more postings, removes the key entirely.
    pub fn remove(&mut self, key: &CompoundKey, doc_key: &str) {
        if let Some(postings) = self.tree.get_mut(key) {
            if let Ok(pos) = postings.binary_search_by(|p| p.as_str().cmp(doc_key)) {
                postings.remove(pos);
            }
            if postings.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Lookup all document keys for an exact key match.
    pub fn lookup_eq(&self, key: &CompoundKey) -> &[DocumentKey] {
        self.tree.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All document keys whose index key starts with `prefix`, in index order.
    ///
    /// An empty prefix returns the whole index.
    pub fn scan_prefix(&self, prefix: &CompoundKey) -> Vec<DocumentKey> {
        // A strict prefix sorts before every key that extends it
        self.tree
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .flat_map(|(_, postings)| postings.iter().cloned())
            .collect()
    }

    /// Returns the number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the total number of postings
    pub fn posting_count(&self) -> usize {
        self.tree.values().map(|v| v.len()).sum()
    }

    /// First key holding more than one document, if any
    pub fn first_duplicate(&self) -> Option<&CompoundKey> {
        self.tree
            .iter()
            .find(|(_, postings)| postings.len() > 1)
            .map(|(k, _)| k)
    }
}
