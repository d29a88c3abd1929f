//! Typed scalar encodings inside JSON documents
//!
//! JSON has no date, identifier, or exact decimal type. Documents encode them
//! as single-key wrapper objects:
//!
//! - `{"$date": "2024-05-01T10:00:00Z"}` - RFC 3339 timestamp
//! - `{"$oid": "<uuid>"}` - object identifier (UUID v4)
//! - `{"$numberDecimal": "12.50"}` - exact decimal
//!
//! Decimal fields also accept plain JSON numbers.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const DATE_KEY: &str = "$date";
pub const OID_KEY: &str = "$oid";
pub const DECIMAL_KEY: &str = "$numberDecimal";

/// Encodes a timestamp.
pub fn date(ts: DateTime<Utc>) -> Value {
    json!({ DATE_KEY: ts.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

/// Encodes an object identifier.
pub fn object_id(id: Uuid) -> Value {
    json!({ OID_KEY: id.to_string() })
}

/// Generates a fresh object identifier.
pub fn new_object_id() -> Value {
    object_id(Uuid::new_v4())
}

/// Encodes an exact decimal.
pub fn decimal(d: Decimal) -> Value {
    json!({ DECIMAL_KEY: d.to_string() })
}

/// Returns the inner string of a single-key wrapper object.
fn wrapped<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get(key)?.as_str()
}

/// Decodes a `$date` wrapper.
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    let raw = wrapped(value, DATE_KEY)?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decodes an `$oid` wrapper.
pub fn as_object_id(value: &Value) -> Option<Uuid> {
    Uuid::parse_str(wrapped(value, OID_KEY)?).ok()
}

/// Decodes a `$numberDecimal` wrapper or a plain JSON number.
pub fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::Object(_) => Decimal::from_str(wrapped(value, DECIMAL_KEY)?).ok(),
        _ => None,
    }
}

/// Returns true for objects that are one of the typed wrappers.
pub fn is_wrapper(obj: &Map<String, Value>) -> bool {
    obj.len() == 1
        && (obj.contains_key(DATE_KEY) || obj.contains_key(OID_KEY) || obj.contains_key(DECIMAL_KEY))
}

/// Returns the type name used in validation messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "double"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(obj) => {
            if obj.len() == 1 {
                if as_date(value).is_some() {
                    return "date";
                }
                if as_object_id(value).is_some() {
                    return "objectId";
                }
                if obj.contains_key(DECIMAL_KEY) && as_decimal(value).is_some() {
                    return "decimal";
                }
            }
            "object"
        }
    }
}

/// Rewrites an object id to its hyphenated lowercase spelling.
///
/// Anything that is not a parseable object id is returned unchanged.
pub fn canonical_id(id: &Value) -> Value {
    match as_object_id(id) {
        Some(uuid) => object_id(uuid),
        None => id.clone(),
    }
}

/// Canonical primary-key text for an `_id` value.
///
/// Spellings of the same object id share one key. A string `"abc"` and an
/// object id never collide because the JSON text keeps the wrapper.
pub fn document_key(id: &Value) -> String {
    canonical_id(id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_encoding() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let v = date(ts);
        assert_eq!(v["$date"], "2024-05-01T10:00:00.000Z");
        assert_eq!(as_date(&v), Some(ts));
        assert_eq!(type_name(&v), "date");
    }

    #[test]
    fn test_bare_string_is_not_a_date() {
        assert!(as_date(&json!("2024-05-01T10:00:00Z")).is_none());
        assert!(as_date(&json!({"$date": "yesterday"})).is_none());
    }

    #[test]
    fn test_object_id() {
        let v = new_object_id();
        assert!(as_object_id(&v).is_some());
        assert_eq!(type_name(&v), "objectId");
        assert!(as_object_id(&json!({"$oid": "not-a-uuid"})).is_none());
    }

    #[test]
    fn test_decimal_accepts_numbers_and_wrappers() {
        assert_eq!(as_decimal(&json!(12)), Some(Decimal::new(12, 0)));
        assert_eq!(as_decimal(&json!(-1)), Some(Decimal::new(-1, 0)));
        assert_eq!(as_decimal(&json!(2.5)), Some(Decimal::new(25, 1)));
        assert_eq!(as_decimal(&json!({"$numberDecimal": "10.05"})), Some(Decimal::new(1005, 2)));
        assert!(as_decimal(&json!("10.05")).is_none());
        assert_eq!(type_name(&decimal(Decimal::new(1, 0))), "decimal");
    }

    #[test]
    fn test_wrapper_with_extra_keys_is_plain_object() {
        let v = json!({"$date": "2024-05-01T10:00:00Z", "other": 1});
        assert!(as_date(&v).is_none());
        assert_eq!(type_name(&v), "object");
    }

    #[test]
    fn test_document_key_distinguishes_id_kinds() {
        let s = json!("abc");
        let o = json!({"$oid": "abc"});
        assert_ne!(document_key(&s), document_key(&o));
    }

    /// Uppercase and unhyphenated spellings of one uuid share a key.
    #[test]
    fn test_document_key_folds_object_id_spellings() {
        let lower = json!({"$oid": "67e55044-10b1-426f-9247-bb680e5fe0c8"});
        let upper = json!({"$oid": "67E55044-10B1-426F-9247-BB680E5FE0C8"});
        let simple = json!({"$oid": "67e5504410b1426f9247bb680e5fe0c8"});

        assert_eq!(document_key(&upper), document_key(&lower));
        assert_eq!(document_key(&simple), document_key(&lower));
        assert_eq!(canonical_id(&upper), lower);
        assert_eq!(canonical_id(&json!("ABC")), json!("ABC"));
    }
}
