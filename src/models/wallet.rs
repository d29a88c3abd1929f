//! One wallet per user

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::value;

string_enum! {
    pub enum Currency ("currency") {
        Usd => "USD",
        Eur => "EUR",
        Inr => "INR",
        Gbp => "GBP",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    /// `_id` of the owning user (unique across wallets)
    pub user_id: Value,
    pub balance: Decimal,
    pub currency: Currency,
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Active, zero-balance wallet
    pub fn open(user_id: Value, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: Decimal::ZERO,
            currency,
            is_active: Some(true),
            created_at: now,
            updated_at: Some(now),
        }
    }

    pub fn to_document(&self) -> Value {
        let mut doc = json!({
            "userId": self.user_id,
            "balance": value::decimal(self.balance),
            "currency": self.currency.as_str(),
            "createdAt": value::date(self.created_at),
        });
        if let Some(is_active) = self.is_active {
            doc["isActive"] = Value::Bool(is_active);
        }
        if let Some(updated_at) = self.updated_at {
            doc["updatedAt"] = value::date(updated_at);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_wallet() {
        let wallet = Wallet::open(json!("user-1"), Currency::Inr);
        let doc = wallet.to_document();
        assert_eq!(doc["balance"]["$numberDecimal"], "0");
        assert_eq!(doc["currency"], "INR");
        assert_eq!(doc["isActive"], true);
    }
}
