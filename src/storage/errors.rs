//! Storage error types
//!
//! Error codes:
//! - GPAY_STORAGE_WRITE_FAILED (ERROR severity)
//! - GPAY_STORAGE_READ_FAILED (ERROR severity)
//! - GPAY_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

use thiserror::Error;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the handle stays usable
    Error,
    /// The database cannot be opened
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Record write or fsync failed
    WriteFailed,
    /// Record file could not be read
    ReadFailed,
    /// Checksum or framing failure
    DataCorruption,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::WriteFailed => "GPAY_STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "GPAY_STORAGE_READ_FAILED",
            StorageErrorCode::DataCorruption => "GPAY_DATA_CORRUPTION",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage failure. Corruption always names where it was found.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("[ERROR] GPAY_STORAGE_WRITE_FAILED: {message}")]
    WriteFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[ERROR] GPAY_STORAGE_READ_FAILED: {message}")]
    ReadFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[FATAL] GPAY_DATA_CORRUPTION: {reason} ({location})")]
    Corruption { reason: String, location: String },
}

impl StorageError {
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        StorageError::WriteFailed {
            message: message.into(),
            source,
        }
    }

    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        StorageError::ReadFailed {
            message: message.into(),
            source,
        }
    }

    /// Framing or checksum failure at `offset` in the record file
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        StorageError::Corruption {
            reason: reason.into(),
            location: format!("byte_offset: {}", offset),
        }
    }

    /// A well-framed record whose contents make no sense
    pub fn corruption_for_document(collection: &str, document_key: &str, reason: impl Into<String>) -> Self {
        StorageError::Corruption {
            reason: reason.into(),
            location: format!("document: {}/{}", collection, document_key),
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        match self {
            StorageError::WriteFailed { .. } => StorageErrorCode::WriteFailed,
            StorageError::ReadFailed { .. } => StorageErrorCode::ReadFailed,
            StorageError::Corruption { .. } => StorageErrorCode::DataCorruption,
        }
    }

    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    pub fn message(&self) -> &str {
        match self {
            StorageError::WriteFailed { message, .. } | StorageError::ReadFailed { message, .. } => {
                message
            }
            StorageError::Corruption { reason, .. } => reason,
        }
    }

    /// Where corruption was detected
    pub fn details(&self) -> Option<&str> {
        match self {
            StorageError::Corruption { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
