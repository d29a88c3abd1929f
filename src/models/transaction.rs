//! Money movement records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::value;

string_enum! {
    pub enum TransactionType ("transaction type") {
        Credit => "CREDIT",
        Debit => "DEBIT",
        Transfer => "TRANSFER",
    }
}

string_enum! {
    /// Lifecycle of a transaction; starts at PENDING
    pub enum TransactionStatus ("transaction status") {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// `_id` of the owning user
    pub user_id: Value,
    pub amount: Decimal,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub description: Option<String>,
    /// `TXN<epoch millis>`, stored outside the declared fields
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// New PENDING transaction stamped now, with a generated reference
    pub fn new(user_id: Value, kind: TransactionType, amount: Decimal, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            amount,
            kind,
            status: TransactionStatus::Pending,
            description,
            reference: Some(format!("TXN{}", now.timestamp_millis())),
            created_at: now,
        }
    }

    pub fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    pub fn to_document(&self) -> Value {
        let mut doc = json!({
            "userId": self.user_id,
            "amount": value::decimal(self.amount),
            "type": self.kind.as_str(),
            "status": self.status.as_str(),
            "createdAt": value::date(self.created_at),
        });
        if let Some(ref description) = self.description {
            doc["description"] = Value::String(description.clone());
        }
        if let Some(ref reference) = self.reference {
            doc["reference"] = Value::String(reference.clone());
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_transaction_is_pending() {
        let user_id = value::new_object_id();
        let mut tx = Transaction::new(
            user_id.clone(),
            TransactionType::Transfer,
            Decimal::from_str("25.50").unwrap(),
            Some("rent".into()),
        );
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.reference.as_deref().unwrap().starts_with("TXN"));

        tx.set_status(TransactionStatus::Completed);
        let doc = tx.to_document();
        assert_eq!(doc["userId"], user_id);
        assert_eq!(doc["amount"]["$numberDecimal"], "25.50");
        assert_eq!(doc["type"], "TRANSFER");
        assert_eq!(doc["status"], "COMPLETED");
        assert_eq!(doc["description"], "rent");
    }
}
