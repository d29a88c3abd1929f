//! Document storage subsystem
//!
//! Each database keeps its documents in one append-only record file,
//! `<db_dir>/data/documents.dat`.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates)
//! - Checksum-verified on every read
//! - Latest record wins for the same (collection, document key)
//! - Full-document writes, fsync before acknowledge
//! - Halt on corruption

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::compute_checksum;
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::{ReplayedDocuments, StorageReader};
pub use record::DocumentRecord;
pub use writer::{storage_path, StorageWriter};
