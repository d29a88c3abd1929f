//! Write-time document validation
//!
//! Validation semantics:
//! - All required fields are present
//! - No undeclared fields exist, unless the schema allows them
//! - Field types exactly match schema types (no coercion)
//! - Enum membership, string pattern and length bounds, numeric minimums
//! - `_id`, when present, is a string or an objectId
//! - Null is never a valid field value
//!
//! Fields are visited in sorted order, so the first reported violation is
//! stable for a given document.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::registry::SchemaRegistry;
use super::types::{FieldDef, FieldType};
use crate::value;

/// Schema validator that enforces schema rules on documents.
///
/// Validator does not mutate documents.
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
}

/// Identifies the schema a document is being checked against
struct Target<'a> {
    schema_id: &'a str,
    schema_version: &'a str,
}

impl Target<'_> {
    fn fail(&self, details: ValidationDetails) -> SchemaError {
        SchemaError::validation_failed(self.schema_id, self.schema_version, details)
    }
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates a document against a registered schema.
    ///
    /// # Errors
    ///
    /// - `GPAY_UNKNOWN_SCHEMA` if the schema id is not registered
    /// - `GPAY_UNKNOWN_SCHEMA_VERSION` if the version is not registered
    /// - `GPAY_SCHEMA_VALIDATION_FAILED` on the first violated rule
    pub fn validate_document(
        &self,
        schema_id: &str,
        schema_version: &str,
        document: &Value,
    ) -> SchemaResult<()> {
        if !self.registry.schema_id_exists(schema_id) {
            return Err(SchemaError::unknown_schema(schema_id));
        }

        let schema = self
            .registry
            .get(schema_id, schema_version)
            .ok_or_else(|| SchemaError::unknown_version(schema_id, schema_version))?;

        let target = Target {
            schema_id,
            schema_version,
        };

        let doc_obj = document.as_object().ok_or_else(|| {
            target.fail(ValidationDetails::type_mismatch(
                "$root",
                "object",
                value::type_name(document),
            ))
        })?;

        if let Some(id) = doc_obj.get("_id") {
            match id {
                Value::String(_) => {}
                _ if value::as_object_id(id).is_some() => {}
                _ => {
                    return Err(target.fail(ValidationDetails::type_mismatch(
                        "_id",
                        "string or objectId",
                        value::type_name(id),
                    )))
                }
            }
        }

        self.validate_object(&target, doc_obj, &schema.fields, schema.allow_undeclared, "")
    }

    fn validate_object(
        &self,
        target: &Target<'_>,
        obj: &Map<String, Value>,
        fields: &BTreeMap<String, FieldDef>,
        allow_undeclared: bool,
        path_prefix: &str,
    ) -> SchemaResult<()> {
        if !allow_undeclared {
            for key in obj.keys() {
                if path_prefix.is_empty() && key == "_id" {
                    continue;
                }
                if !fields.contains_key(key) {
                    return Err(target.fail(ValidationDetails::extra_field(make_path(
                        path_prefix,
                        key,
                    ))));
                }
            }
        }

        for (field_name, field_def) in fields {
            let field_path = make_path(path_prefix, field_name);

            match obj.get(field_name) {
                Some(Value::Null) => {
                    return Err(target.fail(ValidationDetails::null_value(&field_path)));
                }
                Some(v) => self.validate_value(target, v, &field_def.field_type, &field_path)?,
                None if field_def.required => {
                    return Err(target.fail(ValidationDetails::missing_field(field_path)));
                }
                None => {}
            }
        }

        Ok(())
    }

    fn validate_value(
        &self,
        target: &Target<'_>,
        v: &Value,
        expected: &FieldType,
        field_path: &str,
    ) -> SchemaResult<()> {
        let mismatch = || {
            target.fail(ValidationDetails::type_mismatch(
                field_path,
                expected.type_name(),
                value::type_name(v),
            ))
        };

        match expected {
            FieldType::String {
                pattern,
                min_length,
                max_length,
            } => {
                let s = v.as_str().ok_or_else(mismatch)?;
                let len = s.chars().count();

                if let Some(min) = min_length {
                    if len < *min {
                        return Err(target.fail(ValidationDetails::new(
                            field_path,
                            format!("length >= {}", min),
                            format!("length {}", len),
                        )));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        return Err(target.fail(ValidationDetails::new(
                            field_path,
                            format!("length <= {}", max),
                            format!("length {}", len),
                        )));
                    }
                }
                if let Some(p) = pattern {
                    let re = self.registry.pattern(p).ok_or_else(|| {
                        SchemaError::malformed_schema(target.schema_id, format!("pattern '{}' not compiled", p))
                    })?;
                    if !re.is_match(s) {
                        return Err(target.fail(ValidationDetails::pattern_mismatch(
                            field_path,
                            p,
                            format!("{:?}", s),
                        )));
                    }
                }
            }
            FieldType::Int { minimum } => {
                let n = v.as_i64().ok_or_else(mismatch)?;
                if let Some(min) = minimum {
                    if n < *min {
                        return Err(target.fail(ValidationDetails::new(
                            field_path,
                            format!(">= {}", min),
                            n.to_string(),
                        )));
                    }
                }
            }
            FieldType::Decimal { minimum } => {
                let d = value::as_decimal(v).ok_or_else(mismatch)?;
                if let Some(min) = minimum {
                    if d < *min {
                        return Err(target.fail(ValidationDetails::new(
                            field_path,
                            format!(">= {}", min),
                            d.to_string(),
                        )));
                    }
                }
            }
            FieldType::Bool => {
                if !v.is_boolean() {
                    return Err(mismatch());
                }
            }
            FieldType::Date => {
                value::as_date(v).ok_or_else(mismatch)?;
            }
            FieldType::ObjectId => {
                value::as_object_id(v).ok_or_else(mismatch)?;
            }
            FieldType::Enum { values } => {
                let member = v.as_str().is_some_and(|s| values.iter().any(|allowed| allowed == s));
                if !member {
                    return Err(target.fail(ValidationDetails::not_in_enum(
                        field_path,
                        values,
                        v.to_string(),
                    )));
                }
            }
            FieldType::Object { fields } => {
                let obj = v.as_object().filter(|o| !value::is_wrapper(o)).ok_or_else(mismatch)?;
                self.validate_object(target, obj, fields, false, field_path)?;
            }
        }

        Ok(())
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::Schema;
    use rust_decimal::Decimal;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_registry() -> (TempDir, SchemaRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::new(temp_dir.path());

        let mut fields = BTreeMap::new();
        fields.insert("name".into(), FieldDef::required_string());
        fields.insert("age".into(), FieldDef::optional_int());
        fields.insert("active".into(), FieldDef::required_bool());
        fields.insert(
            "nick".into(),
            FieldDef::optional_bounded_string(Some(1), Some(5)),
        );
        fields.insert("code".into(), FieldDef::optional(FieldType::String {
            pattern: Some("^[A-Z]{3}$".into()),
            min_length: None,
            max_length: None,
        }));
        fields.insert("tier".into(), FieldDef::enumeration(["GOLD", "SILVER"], false));
        fields.insert("balance".into(), FieldDef::optional(FieldType::Decimal {
            minimum: Some(Decimal::ZERO),
        }));
        fields.insert("joinedAt".into(), FieldDef::optional_date());
        fields.insert("ownerId".into(), FieldDef::optional(FieldType::ObjectId));

        registry.register(Schema::new("users", "v1", fields)).unwrap();

        (temp_dir, registry)
    }

    fn field_of(err: SchemaError) -> String {
        err.details().unwrap().field.clone()
    }

    #[test]
    fn test_valid_document_passes() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({
            "_id": "user_123",
            "name": "Alice",
            "active": true,
            "tier": "GOLD",
            "balance": {"$numberDecimal": "10.00"},
            "joinedAt": {"$date": "2024-01-01T00:00:00Z"},
            "ownerId": {"$oid": "67e55044-10b1-426f-9247-bb680e5fe0c8"}
        });

        assert!(validator.validate_document("users", "v1", &doc).is_ok());
    }

    #[test]
    fn test_id_is_optional_before_assignment() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": "Alice", "active": true });
        assert!(validator.validate_document("users", "v1", &doc).is_ok());
    }

    #[test]
    fn test_bad_id_type_rejected() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "_id": 7, "name": "Alice", "active": true });
        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(field_of(err), "_id");
    }

    #[test]
    fn test_missing_required_field_fails() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "active": true });

        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(err.code().code(), "GPAY_SCHEMA_VALIDATION_FAILED");
        assert!(err.message().contains("name"));
    }

    #[test]
    fn test_extra_field_fails_on_closed_schema() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": "Alice", "active": true, "unknown_field": "value" });

        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(field_of(err), "unknown_field");
    }

    #[test]
    fn test_extra_field_allowed_on_open_schema() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::new(temp_dir.path());
        let mut fields = BTreeMap::new();
        fields.insert("name".into(), FieldDef::required_string());
        registry.register(Schema::new("open", "v1", fields).open()).unwrap();

        let validator = SchemaValidator::new(&registry);
        let doc = json!({ "name": "Alice", "pin": "1234" });
        assert!(validator.validate_document("open", "v1", &doc).is_ok());
    }

    #[test]
    fn test_type_mismatch_fails() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": 123, "active": true });

        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.field, "name");
        assert_eq!(details.expected, "string");
        assert_eq!(details.actual, "int");
    }

    #[test]
    fn test_null_rejected() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": "Alice", "active": true, "age": null });

        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(err.details().unwrap().actual, "null");
    }

    #[test]
    fn test_string_length_bounds() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let empty = json!({ "name": "A", "active": true, "nick": "" });
        assert!(validator.validate_document("users", "v1", &empty).is_err());

        let long = json!({ "name": "A", "active": true, "nick": "toolong" });
        assert!(validator.validate_document("users", "v1", &long).is_err());

        // Length counts characters, not bytes
        let unicode = json!({ "name": "A", "active": true, "nick": "ééééé" });
        assert!(validator.validate_document("users", "v1", &unicode).is_ok());
    }

    #[test]
    fn test_pattern_mismatch() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": "A", "active": true, "code": "abc" });
        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(field_of(err), "code");
    }

    #[test]
    fn test_enum_membership() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": "A", "active": true, "tier": "BRONZE" });
        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert!(err.details().unwrap().expected.contains("GOLD"));

        let not_string = json!({ "name": "A", "active": true, "tier": 1 });
        assert!(validator.validate_document("users", "v1", &not_string).is_err());
    }

    #[test]
    fn test_decimal_minimum() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let negative = json!({ "name": "A", "active": true, "balance": -1 });
        let err = validator.validate_document("users", "v1", &negative).unwrap_err();
        assert_eq!(err.details().unwrap().expected, ">= 0");

        let wrapped = json!({ "name": "A", "active": true, "balance": {"$numberDecimal": "-0.01"} });
        assert!(validator.validate_document("users", "v1", &wrapped).is_err());

        let zero = json!({ "name": "A", "active": true, "balance": 0 });
        assert!(validator.validate_document("users", "v1", &zero).is_ok());
    }

    #[test]
    fn test_date_requires_wrapper() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "name": "A", "active": true, "joinedAt": "2024-01-01T00:00:00Z" });
        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(err.details().unwrap().expected, "date");
    }

    #[test]
    fn test_unknown_schema_rejected() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "_id": "x" });
        let result = validator.validate_document("nonexistent", "v1", &doc);
        assert_eq!(result.unwrap_err().code().code(), "GPAY_UNKNOWN_SCHEMA");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "_id": "x" });
        let result = validator.validate_document("users", "v999", &doc);
        assert_eq!(result.unwrap_err().code().code(), "GPAY_UNKNOWN_SCHEMA_VERSION");
    }

    #[test]
    fn test_non_object_document_rejected() {
        let (_temp_dir, registry) = setup_registry();
        let validator = SchemaValidator::new(&registry);

        let err = validator.validate_document("users", "v1", &json!([1, 2])).unwrap_err();
        assert_eq!(field_of(err), "$root");
    }

    #[test]
    fn test_nested_object_validation() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::new(temp_dir.path());

        let mut address_fields = BTreeMap::new();
        address_fields.insert("city".into(), FieldDef::required_string());
        address_fields.insert("zip".into(), FieldDef::required_string());

        let mut fields = BTreeMap::new();
        fields.insert("address".into(), FieldDef::required_object(address_fields));

        registry.register(Schema::new("users", "v1", fields)).unwrap();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({ "address": { "city": "NYC", "zip": "10001" } });
        assert!(validator.validate_document("users", "v1", &doc).is_ok());

        let doc = json!({ "address": { "city": "NYC" } });
        let err = validator.validate_document("users", "v1", &doc).unwrap_err();
        assert_eq!(field_of(err), "address.zip");

        // A typed wrapper is not a nested object
        let doc = json!({ "address": { "$date": "2024-01-01T00:00:00Z" } });
        assert!(validator.validate_document("users", "v1", &doc).is_err());
    }
}
