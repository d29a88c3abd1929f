//! Index specifications
//!
//! An index is named after its keys the same way the catalog lists them:
//! `email_1`, `createdAt_-1`, `userId_1_createdAt_-1`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the implicit primary-key index present on every collection.
pub const PRIMARY_INDEX_NAME: &str = "_id_";

/// Sort direction of one index key part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Suffix used in generated index names
    pub fn suffix(&self) -> &'static str {
        match self {
            Direction::Asc => "1",
            Direction::Desc => "-1",
        }
    }
}

/// One field of an index key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub field: String,
    pub direction: Direction,
}

impl IndexField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Declarative secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<IndexField>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Builds a spec named after its keys.
    pub fn new(keys: Vec<IndexField>) -> Self {
        let name = default_name(&keys);
        Self {
            name,
            keys,
            unique: false,
        }
    }

    /// Single ascending field
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(vec![IndexField::asc(field)])
    }

    /// Single descending field
    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(vec![IndexField::desc(field)])
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Field names in key order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.field.as_str())
    }

    /// Returns the single field this index covers, if it is not compound.
    pub fn single_field(&self) -> Option<&str> {
        match self.keys.as_slice() {
            [only] => Some(only.field.as_str()),
            _ => None,
        }
    }

    /// Checks the spec is usable as a secondary index.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("index name must not be empty".into());
        }
        if self.name == PRIMARY_INDEX_NAME {
            return Err(format!("'{}' is reserved for the primary key", PRIMARY_INDEX_NAME));
        }
        if self.keys.is_empty() {
            return Err(format!("index '{}' has no keys", self.name));
        }
        for (i, key) in self.keys.iter().enumerate() {
            if key.field.is_empty() {
                return Err(format!("index '{}' has an empty field name", self.name));
            }
            if self.keys[..i].iter().any(|k| k.field == key.field) {
                return Err(format!(
                    "index '{}' lists field '{}' twice",
                    self.name, key.field
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.unique {
            write!(f, " (unique)")?;
        }
        Ok(())
    }
}

fn default_name(keys: &[IndexField]) -> String {
    keys.iter()
        .map(|k| format!("{}_{}", k.field, k.direction.suffix()))
        .collect::<Vec<_>>()
        .join("_")
}
