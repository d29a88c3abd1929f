//! CLI-specific error types
//!
//! Engine and initializer failures keep their own `GPAY_*` code.

use std::fmt;
use std::io;

use crate::bootstrap::InitError;
use crate::db::DbError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Malformed command input
    InvalidInput,
    /// Failure reported by the engine or the initializer
    Engine(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "GPAY_CLI_CONFIG_ERROR",
            Self::IoError => "GPAY_CLI_IO_ERROR",
            Self::InvalidInput => "GPAY_CLI_INVALID_INPUT",
            Self::Engine(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<DbError> for CliError {
    fn from(e: DbError) -> Self {
        Self::new(CliErrorCode::Engine(e.code()), e.to_string())
    }
}

impl From<InitError> for CliError {
    fn from(e: InitError) -> Self {
        Self::new(CliErrorCode::Engine(e.code()), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_code_passes_through() {
        let err: CliError = DbError::CollectionNotFound("ledger".into()).into();
        assert_eq!(err.code_str(), "GPAY_COLLECTION_NOT_FOUND");
        assert!(err.message().contains("ledger"));
    }

    #[test]
    fn test_cli_codes() {
        assert_eq!(CliError::config_error("x").code_str(), "GPAY_CLI_CONFIG_ERROR");
        assert_eq!(CliError::invalid_input("x").code_str(), "GPAY_CLI_INVALID_INPUT");
        let err: CliError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert_eq!(*err.code(), CliErrorCode::IoError);
    }
}
