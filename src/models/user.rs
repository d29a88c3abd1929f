//! User account model

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::value;

string_enum! {
    /// Account status
    pub enum UserStatus ("user status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Suspended => "SUSPENDED",
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Email address (unique)
    pub email: String,

    /// E.164 phone number (unique)
    pub phone_number: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<UserStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Application-owned fields outside the schema (password hash, PIN, roles)
    pub extra: Map<String, Value>,
}

impl User {
    /// New ACTIVE user with both timestamps set to now
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            email: email.into(),
            phone_number: phone_number.into(),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            status: Some(UserStatus::Active),
            created_at: now,
            updated_at: Some(now),
            extra: Map::new(),
        }
    }

    /// Adds an application-owned field
    pub fn with_extra(mut self, key: impl Into<String>, v: Value) -> Self {
        self.extra.insert(key.into(), v);
        self
    }

    /// Document form, without `_id`
    pub fn to_document(&self) -> Value {
        let mut doc = self.extra.clone();
        doc.insert("email".into(), Value::String(self.email.clone()));
        doc.insert("phoneNumber".into(), Value::String(self.phone_number.clone()));
        if let Some(ref first_name) = self.first_name {
            doc.insert("firstName".into(), Value::String(first_name.clone()));
        }
        if let Some(ref last_name) = self.last_name {
            doc.insert("lastName".into(), Value::String(last_name.clone()));
        }
        if let Some(status) = self.status {
            doc.insert("status".into(), Value::String(status.as_str().into()));
        }
        doc.insert("createdAt".into(), value::date(self.created_at));
        if let Some(updated_at) = self.updated_at {
            doc.insert("updatedAt".into(), value::date(updated_at));
        }
        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(serde_json::to_value(UserStatus::Suspended).unwrap(), "SUSPENDED");
        assert_eq!("INACTIVE".parse::<UserStatus>().unwrap(), UserStatus::Inactive);
        assert!("active".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_to_document() {
        let user = User::new("John", "Doe", "john.doe@example.com", "+1234567890")
            .with_extra("roles", serde_json::json!(["USER"]));
        let doc = user.to_document();

        assert_eq!(doc["firstName"], "John");
        assert_eq!(doc["phoneNumber"], "+1234567890");
        assert_eq!(doc["status"], "ACTIVE");
        assert_eq!(doc["roles"][0], "USER");
        assert!(value::as_date(&doc["createdAt"]).is_some());
        assert_eq!(doc["createdAt"], doc["updatedAt"]);
        assert!(doc.get("_id").is_none());
    }
}
