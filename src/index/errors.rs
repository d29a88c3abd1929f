//! Index error types
//!
//! Error codes:
//! - GPAY_DUPLICATE_KEY (REJECT)
//! - GPAY_INDEX_OPTIONS_CONFLICT (REJECT)
//! - GPAY_INDEX_NOT_FOUND (REJECT)
//! - GPAY_INVALID_INDEX_SPEC (REJECT)

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation rejected, state unchanged
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Unique index or primary key would hold two documents under one key
    DuplicateKey,
    /// Index name reused with different keys or options
    OptionsConflict,
    /// No index with the requested name
    IndexNotFound,
    /// Spec cannot be built
    InvalidSpec,
}

impl IndexErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::DuplicateKey => "GPAY_DUPLICATE_KEY",
            IndexErrorCode::OptionsConflict => "GPAY_INDEX_OPTIONS_CONFLICT",
            IndexErrorCode::IndexNotFound => "GPAY_INDEX_NOT_FOUND",
            IndexErrorCode::InvalidSpec => "GPAY_INVALID_INDEX_SPEC",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    /// Index involved, if any
    index_name: Option<String>,
}

impl IndexError {
    /// Create a duplicate key error
    pub fn duplicate_key(
        collection: &str,
        index_name: impl Into<String>,
        key: impl fmt::Display,
    ) -> Self {
        let index_name = index_name.into();
        Self {
            code: IndexErrorCode::DuplicateKey,
            message: format!(
                "Duplicate key in {}.{}: {}",
                collection, index_name, key
            ),
            index_name: Some(index_name),
        }
    }

    /// Create an options conflict error
    pub fn options_conflict(index_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let index_name = index_name.into();
        Self {
            code: IndexErrorCode::OptionsConflict,
            message: format!("Index '{}' conflicts: {}", index_name, reason.into()),
            index_name: Some(index_name),
        }
    }

    /// Create an index not found error
    pub fn not_found(index_name: impl Into<String>) -> Self {
        let index_name = index_name.into();
        Self {
            code: IndexErrorCode::IndexNotFound,
            message: format!("Index '{}' not found", index_name),
            index_name: Some(index_name),
        }
    }

    /// Create an invalid spec error
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::InvalidSpec,
            message: reason.into(),
            index_name: None,
        }
    }

    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
