//! Schema subsystem
//!
//! Every collection is bound to a schema version, and every write is checked
//! against it before it reaches storage.
//!
//! # Design Principles
//!
//! - Mandatory on all writes
//! - Validation before persistence
//! - Explicit version binding
//! - Violations abort writes
//! - No nulls, defaults, or coercion
//! - Deterministic validation

mod errors;
mod registry;
mod types;
mod validator;

pub use errors::{Severity, SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use registry::SchemaRegistry;
pub use types::{FieldDef, FieldType, Schema};
pub use validator::SchemaValidator;
