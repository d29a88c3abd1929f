//! Database engine errors
//!
//! Subsystem errors keep their own codes; engine-level failures get theirs here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::index::IndexError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    // ==================
    // Subsystem Errors
    // ==================
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    // ==================
    // Catalog Misuse
    // ==================
    #[error("[REJECT] GPAY_COLLECTION_EXISTS: Collection '{0}' already exists")]
    CollectionExists(String),

    #[error("[REJECT] GPAY_COLLECTION_NOT_FOUND: Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Database or collection name outside `[A-Za-z0-9_-]{1,64}`
    #[error("[REJECT] GPAY_INVALID_NAME: Invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    // ==================
    // Data Directory
    // ==================
    #[error("[FATAL] GPAY_DATA_DIR_LOCKED: Data directory {0} is in use by another handle")]
    Locked(PathBuf),

    #[error("[ERROR] GPAY_CATALOG_ERROR: {message}")]
    Catalog {
        message: String,
        #[source]
        source: Option<io::Error>,
    },
}

impl DbError {
    pub fn catalog(message: impl Into<String>, source: io::Error) -> Self {
        DbError::Catalog {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn catalog_invalid(message: impl Into<String>) -> Self {
        DbError::Catalog {
            message: message.into(),
            source: None,
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Schema(e) => e.code().code(),
            DbError::Index(e) => e.code().code(),
            DbError::Storage(e) => e.code().code(),
            DbError::CollectionExists(_) => "GPAY_COLLECTION_EXISTS",
            DbError::CollectionNotFound(_) => "GPAY_COLLECTION_NOT_FOUND",
            DbError::InvalidName { .. } => "GPAY_INVALID_NAME",
            DbError::Locked(_) => "GPAY_DATA_DIR_LOCKED",
            DbError::Catalog { .. } => "GPAY_CATALOG_ERROR",
        }
    }

    /// Whether the write was refused by a validator or unique index
    pub fn is_rejection(&self) -> bool {
        matches!(self, DbError::Schema(_) | DbError::Index(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationDetails;

    #[test]
    fn test_codes_pass_through() {
        let err: DbError = SchemaError::validation_failed(
            "users",
            "v1",
            ValidationDetails::missing_field("email"),
        )
        .into();
        assert_eq!(err.code(), "GPAY_SCHEMA_VALIDATION_FAILED");
        assert!(err.is_rejection());
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_engine_codes() {
        assert_eq!(DbError::CollectionExists("users".into()).code(), "GPAY_COLLECTION_EXISTS");
        assert_eq!(DbError::Locked(PathBuf::from("/tmp/x")).code(), "GPAY_DATA_DIR_LOCKED");
        let err = DbError::InvalidName {
            kind: "database",
            name: "bad name".into(),
        };
        assert!(err.to_string().contains("GPAY_INVALID_NAME"));
        assert!(!err.is_rejection());
    }
}
