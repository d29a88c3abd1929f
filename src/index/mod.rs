//! Index subsystem
//!
//! Secondary indexes are derived, in-memory state rebuilt from the collection
//! documents on open. Only index specs are persisted.
//!
//! # Design Principles
//!
//! - Derived state: Indexes mirror storage, never the source of truth
//! - Deterministic: BTreeMap iteration order, sorted postings
//!
//! # Invariants
//!
//! - Unique indexes are checked before the storage write
//! - Index updates occur AFTER storage writes
//! - A missing field indexes as null

mod btree;
mod errors;
mod manager;
mod spec;

pub use btree::{CompoundKey, DocumentKey, IndexKey, IndexTree, KeyPart};
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use manager::{primary_spec, IndexManager};
pub use spec::{Direction, IndexField, IndexSpec, PRIMARY_INDEX_NAME};
