//! Schema error types
//!
//! Error codes:
//! - GPAY_UNKNOWN_SCHEMA (REJECT)
//! - GPAY_UNKNOWN_SCHEMA_VERSION (REJECT)
//! - GPAY_SCHEMA_VALIDATION_FAILED (REJECT)
//! - GPAY_SCHEMA_IMMUTABLE (REJECT)
//! - GPAY_MALFORMED_SCHEMA (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Write rejected, engine continues
    Reject,
    /// Database cannot be opened
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema ID not found
    UnknownSchema,
    /// Schema version not found
    UnknownSchemaVersion,
    /// Document violates schema
    ValidationFailed,
    /// Attempt to redefine an existing schema version
    SchemaImmutable,
    /// Schema definition or file is structurally invalid
    MalformedSchema,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnknownSchema => "GPAY_UNKNOWN_SCHEMA",
            SchemaErrorCode::UnknownSchemaVersion => "GPAY_UNKNOWN_SCHEMA_VERSION",
            SchemaErrorCode::ValidationFailed => "GPAY_SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::SchemaImmutable => "GPAY_SCHEMA_IMMUTABLE",
            SchemaErrorCode::MalformedSchema => "GPAY_MALFORMED_SCHEMA",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::MalformedSchema => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Dotted path of the offending field
    pub field: String,
    /// What the schema expected
    pub expected: String,
    /// What the document contained
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }

    pub fn not_in_enum(field: impl Into<String>, values: &[String], actual: impl Into<String>) -> Self {
        Self::new(field, format!("one of [{}]", values.join(", ")), actual)
    }

    pub fn pattern_mismatch(field: impl Into<String>, pattern: &str, actual: impl Into<String>) -> Self {
        Self::new(field, format!("value matching /{}/", pattern), actual)
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    schema_id: Option<String>,
    schema_version: Option<String>,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            schema_id: None,
            schema_version: None,
            details: None,
        }
    }

    fn for_schema(mut self, schema_id: String, schema_version: Option<String>) -> Self {
        self.schema_id = Some(schema_id);
        self.schema_version = schema_version;
        self
    }

    pub fn unknown_schema(schema_id: impl Into<String>) -> Self {
        let id = schema_id.into();
        Self::new(
            SchemaErrorCode::UnknownSchema,
            format!("no schema registered for collection '{}'", id),
        )
        .for_schema(id, None)
    }

    pub fn unknown_version(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let (id, ver) = (schema_id.into(), version.into());
        Self::new(
            SchemaErrorCode::UnknownSchemaVersion,
            format!("collection '{}' has no schema version '{}'", id, ver),
        )
        .for_schema(id, Some(ver))
    }

    /// A document broke the rule described by `details`
    pub fn validation_failed(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        details: ValidationDetails,
    ) -> Self {
        let mut err = Self::new(
            SchemaErrorCode::ValidationFailed,
            format!("document rejected by validator: {}", details),
        )
        .for_schema(schema_id.into(), Some(schema_version.into()));
        err.details = Some(details);
        err
    }

    /// (id, version) is already registered with different rules
    pub fn schema_immutable(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let (id, ver) = (schema_id.into(), version.into());
        Self::new(
            SchemaErrorCode::SchemaImmutable,
            format!("'{}' {} is registered with different rules; publish a new version", id, ver),
        )
        .for_schema(id, Some(ver))
    }

    pub fn malformed_schema(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::MalformedSchema,
            format!("invalid schema definition in {}: {}", origin.into(), reason.into()),
        )
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_malformed_is_fatal() {
        assert!(SchemaError::malformed_schema("x.json", "bad").is_fatal());
        assert!(!SchemaError::unknown_schema("users").is_fatal());
        assert!(!SchemaError::schema_immutable("users", "v1").is_fatal());
    }

    #[test]
    fn test_enum_details_lists_values() {
        let values = vec!["USD".to_string(), "EUR".to_string()];
        let details = ValidationDetails::not_in_enum("currency", &values, "\"JPY\"");
        assert_eq!(details.expected, "one of [USD, EUR]");
    }

    #[test]
    fn test_validation_failure_carries_context() {
        let err = SchemaError::validation_failed(
            "users",
            "v1",
            ValidationDetails::missing_field("email"),
        );
        assert_eq!(err.schema_id(), Some("users"));
        assert_eq!(err.schema_version(), Some("v1"));
        assert_eq!(err.details().unwrap().field, "email");
        assert_eq!(
            err.to_string(),
            "[REJECT] GPAY_SCHEMA_VALIDATION_FAILED: document rejected by validator: \
             field 'email': expected field to be present, got missing"
        );
    }
}
