//! Schema type definitions
//!
//! Supported types:
//! - string: UTF-8 string with optional pattern and length bounds
//! - int: 64-bit signed integer with optional lower bound
//! - decimal: exact decimal with optional lower bound
//! - bool: Boolean
//! - date: `$date` timestamp
//! - objectId: `$oid` identifier
//! - enum: string drawn from a fixed value list
//! - object: nested object with field schema

use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldType {
    /// UTF-8 string
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// 64-bit signed integer
    Int {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
    },
    /// Exact decimal
    Decimal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<Decimal>,
    },
    /// Boolean
    Bool,
    /// Timestamp
    Date,
    /// Object identifier
    ObjectId,
    /// String restricted to a fixed set of values
    Enum { values: Vec<String> },
    /// Nested object with its own field schema
    Object { fields: BTreeMap<String, FieldDef> },
}

impl FieldType {
    /// Unconstrained string
    pub fn string() -> Self {
        FieldType::String {
            pattern: None,
            min_length: None,
            max_length: None,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Int { .. } => "int",
            FieldType::Decimal { .. } => "decimal",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::ObjectId => "objectId",
            FieldType::Enum { .. } => "enum",
            FieldType::Object { .. } => "object",
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    pub fn new(field_type: FieldType, required: bool) -> Self {
        Self {
            field_type,
            required,
            description: None,
        }
    }

    pub fn required(field_type: FieldType) -> Self {
        Self::new(field_type, true)
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self::new(field_type, false)
    }

    /// Create a required unconstrained string field
    pub fn required_string() -> Self {
        Self::required(FieldType::string())
    }

    /// Create an optional unconstrained string field
    pub fn optional_string() -> Self {
        Self::optional(FieldType::string())
    }

    /// Create a required string field matching `pattern`
    pub fn required_pattern(pattern: impl Into<String>) -> Self {
        Self::required(FieldType::String {
            pattern: Some(pattern.into()),
            min_length: None,
            max_length: None,
        })
    }

    /// Create an optional string field with length bounds (in characters)
    pub fn optional_bounded_string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self::optional(FieldType::String {
            pattern: None,
            min_length,
            max_length,
        })
    }

    pub fn required_int() -> Self {
        Self::required(FieldType::Int { minimum: None })
    }

    pub fn optional_int() -> Self {
        Self::optional(FieldType::Int { minimum: None })
    }

    /// Create a required decimal field with lower bound
    pub fn required_decimal(minimum: Option<Decimal>) -> Self {
        Self::required(FieldType::Decimal { minimum })
    }

    pub fn required_bool() -> Self {
        Self::required(FieldType::Bool)
    }

    pub fn optional_bool() -> Self {
        Self::optional(FieldType::Bool)
    }

    pub fn required_date() -> Self {
        Self::required(FieldType::Date)
    }

    pub fn optional_date() -> Self {
        Self::optional(FieldType::Date)
    }

    pub fn required_object_id() -> Self {
        Self::required(FieldType::ObjectId)
    }

    /// Create an enum field from any list of string-like values
    pub fn enumeration<I, S>(values: I, required: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            FieldType::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
            required,
        )
    }

    pub fn required_object(fields: BTreeMap<String, FieldDef>) -> Self {
        Self::required(FieldType::Object { fields })
    }

    /// Attach a human-readable rule description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Complete schema definition for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Collection this schema governs
    pub schema_id: String,
    /// Schema version
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions
    pub fields: BTreeMap<String, FieldDef>,
    /// Whether fields not listed in `fields` may be stored
    #[serde(default)]
    pub allow_undeclared: bool,
}

impl Schema {
    /// Create a new closed schema (undeclared fields rejected)
    pub fn new(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        fields: BTreeMap<String, FieldDef>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_version: schema_version.into(),
            description: None,
            fields,
            allow_undeclared: false,
        }
    }

    /// Permit undeclared fields
    pub fn open(mut self) -> Self {
        self.allow_undeclared = true;
        self
    }

    /// Returns the unique key for this schema (id, version)
    pub fn key(&self) -> (&str, &str) {
        (&self.schema_id, &self.schema_version)
    }

    /// Names of all required top-level fields, sorted
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.schema_id.is_empty() {
            return Err("Schema id must not be empty".into());
        }
        if self.schema_version.is_empty() {
            return Err("Schema version must not be empty".into());
        }
        validate_fields(&self.fields, "")
    }

    /// All regex patterns used anywhere in this schema
    pub fn patterns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_patterns(&self.fields, &mut out);
        out
    }
}

fn validate_fields(fields: &BTreeMap<String, FieldDef>, prefix: &str) -> Result<(), String> {
    for (name, def) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        if name.is_empty() {
            return Err(format!("Empty field name under '{}'", prefix));
        }
        // _id is implicit on every collection
        if prefix.is_empty() && name == "_id" {
            return Err("'_id' is implicit and must not be declared".into());
        }

        match &def.field_type {
            FieldType::String {
                pattern,
                min_length,
                max_length,
            } => {
                if let (Some(min), Some(max)) = (min_length, max_length) {
                    if min > max {
                        return Err(format!(
                            "Field '{}': min_length {} exceeds max_length {}",
                            path, min, max
                        ));
                    }
                }
                if let Some(p) = pattern {
                    Regex::new(p)
                        .map_err(|e| format!("Field '{}': invalid pattern: {}", path, e))?;
                }
            }
            FieldType::Enum { values } => {
                if values.is_empty() {
                    return Err(format!("Field '{}': enum must list at least one value", path));
                }
            }
            FieldType::Object { fields } => validate_fields(fields, &path)?,
            _ => {}
        }
    }
    Ok(())
}

fn collect_patterns<'a>(fields: &'a BTreeMap<String, FieldDef>, out: &mut Vec<&'a str>) {
    for def in fields.values() {
        match &def.field_type {
            FieldType::String {
                pattern: Some(p), ..
            } => out.push(p),
            FieldType::Object { fields } => collect_patterns(fields, out),
            _ => {}
        }
    }
}
