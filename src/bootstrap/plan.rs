//! Declarative bootstrap plans
//!
//! A plan names one database and lists, in application order, the
//! collections to create (schema plus indexes) and the seed documents to
//! insert afterwards.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{InitError, InitResult};
use crate::index::IndexSpec;
use crate::schema::Schema;

/// What to do when the plan meets collections that already exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunPolicy {
    /// Identical collections and indexes are no-ops; present seeds are skipped
    #[default]
    Reconcile,
    /// Any existing collection fails the run before anything is written
    Strict,
    /// Like `Reconcile`, but a newer planned schema version replaces the
    /// active one once every stored document validates
    Upgrade,
}

impl RerunPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RerunPolicy::Reconcile => "reconcile",
            RerunPolicy::Strict => "strict",
            RerunPolicy::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for RerunPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RerunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reconcile" => Ok(RerunPolicy::Reconcile),
            "strict" => Ok(RerunPolicy::Strict),
            "upgrade" => Ok(RerunPolicy::Upgrade),
            other => Err(format!(
                "unknown rerun policy '{}' (expected reconcile, strict or upgrade)",
                other
            )),
        }
    }
}

/// One collection: its validator and secondary indexes
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPlan {
    pub schema: Schema,
    pub indexes: Vec<IndexSpec>,
}

impl CollectionPlan {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            indexes: Vec::new(),
        }
    }

    pub fn index(mut self, spec: IndexSpec) -> Self {
        self.indexes.push(spec);
        self
    }

    /// Collection name (the schema id)
    pub fn name(&self) -> &str {
        &self.schema.schema_id
    }
}

/// Documents inserted into one collection after all collections exist.
///
/// With `match_field` set, a document whose value for that field is already
/// stored is skipped instead of inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedBatch {
    pub collection: String,
    pub documents: Vec<Value>,
    pub match_field: Option<String>,
}

impl SeedBatch {
    pub fn new(collection: impl Into<String>, documents: Vec<Value>) -> Self {
        Self {
            collection: collection.into(),
            documents,
            match_field: None,
        }
    }

    pub fn matched_by(mut self, field: impl Into<String>) -> Self {
        self.match_field = Some(field.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapPlan {
    pub database: String,
    pub collections: Vec<CollectionPlan>,
    pub seeds: Vec<SeedBatch>,
}

impl BootstrapPlan {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: Vec::new(),
            seeds: Vec::new(),
        }
    }

    pub fn collection(mut self, plan: CollectionPlan) -> Self {
        self.collections.push(plan);
        self
    }

    pub fn seed(mut self, batch: SeedBatch) -> Self {
        self.seeds.push(batch);
        self
    }

    /// Same plan against another database name
    pub fn for_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name()).collect()
    }

    /// Total number of secondary indexes across all collections
    pub fn index_count(&self) -> usize {
        self.collections.iter().map(|c| c.indexes.len()).sum()
    }

    /// Structural checks run before anything touches the database
    pub fn validate(&self) -> InitResult<()> {
        let mut names = BTreeSet::new();
        for coll in &self.collections {
            if !names.insert(coll.name()) {
                return Err(InitError::InvalidPlan(format!(
                    "collection '{}' is planned twice",
                    coll.name()
                )));
            }
            coll.schema
                .validate_structure()
                .map_err(|e| InitError::InvalidPlan(format!("schema '{}': {}", coll.name(), e)))?;
            for spec in &coll.indexes {
                spec.validate().map_err(|e| {
                    InitError::InvalidPlan(format!("index on '{}': {}", coll.name(), e))
                })?;
            }
        }
        for batch in &self.seeds {
            if !names.contains(batch.collection.as_str()) {
                return Err(InitError::InvalidPlan(format!(
                    "seed batch targets unplanned collection '{}'",
                    batch.collection
                )));
            }
        }
        Ok(())
    }
}
