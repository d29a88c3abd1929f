//! Saved payment instruments

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::value;

string_enum! {
    pub enum PaymentMethodType ("payment method type") {
        CreditCard => "CREDIT_CARD",
        DebitCard => "DEBIT_CARD",
        BankAccount => "BANK_ACCOUNT",
        Upi => "UPI",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethod {
    pub user_id: Value,
    pub kind: PaymentMethodType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(user_id: Value, kind: PaymentMethodType) -> Self {
        Self {
            user_id,
            kind,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn to_document(&self) -> Value {
        json!({
            "userId": self.user_id,
            "type": self.kind.as_str(),
            "isActive": self.is_active,
            "createdAt": value::date(self.created_at),
        })
    }
}
