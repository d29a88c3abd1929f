//! The GPay bootstrap plan
//!
//! Four collections under `gpay_db`, fourteen secondary indexes and two
//! sample users. Enum lists come from the record models.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;

use super::plan::{BootstrapPlan, CollectionPlan, SeedBatch};
use crate::index::{IndexField, IndexSpec};
use crate::models::{
    enum_values, Currency, PaymentMethodType, TransactionStatus, TransactionType, User, UserStatus,
};
use crate::schema::{FieldDef, Schema};

pub const DEFAULT_DATABASE: &str = "gpay_db";
pub const SCHEMA_VERSION: &str = "v1";

pub const USERS: &str = "users";
pub const TRANSACTIONS: &str = "transactions";
pub const WALLETS: &str = "wallets";
pub const PAYMENT_METHODS: &str = "payment_methods";

pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
pub const PHONE_PATTERN: &str = r"^[+]?[1-9]\d{1,14}$";

const NAME_MAX_LEN: usize = 50;
const DESCRIPTION_MAX_LEN: usize = 255;

/// The full GPay plan with seed timestamps taken now
pub fn gpay_plan() -> BootstrapPlan {
    BootstrapPlan::new(DEFAULT_DATABASE)
        .collection(users())
        .collection(transactions())
        .collection(wallets())
        .collection(payment_methods())
        .seed(SeedBatch::new(USERS, seed_users()).matched_by("email"))
}

fn users() -> CollectionPlan {
    let mut fields = BTreeMap::new();
    fields.insert(
        "email".to_string(),
        FieldDef::required_pattern(EMAIL_PATTERN).describe("must be a valid email"),
    );
    fields.insert(
        "phoneNumber".to_string(),
        FieldDef::required_pattern(PHONE_PATTERN).describe("must be a valid phone number"),
    );
    fields.insert(
        "firstName".to_string(),
        FieldDef::optional_bounded_string(Some(1), Some(NAME_MAX_LEN)),
    );
    fields.insert(
        "lastName".to_string(),
        FieldDef::optional_bounded_string(Some(1), Some(NAME_MAX_LEN)),
    );
    fields.insert(
        "status".to_string(),
        FieldDef::enumeration(enum_values(UserStatus::ALL, UserStatus::as_str), false)
            .describe("must be a valid status"),
    );
    fields.insert("createdAt".to_string(), FieldDef::required_date());
    fields.insert("updatedAt".to_string(), FieldDef::optional_date());

    CollectionPlan::new(Schema::new(USERS, SCHEMA_VERSION, fields).open())
        .index(IndexSpec::ascending("email").unique())
        .index(IndexSpec::ascending("phoneNumber").unique())
        .index(IndexSpec::ascending("status"))
        .index(IndexSpec::ascending("createdAt"))
}

fn transactions() -> CollectionPlan {
    let mut fields = BTreeMap::new();
    fields.insert("userId".to_string(), FieldDef::required_object_id());
    fields.insert(
        "amount".to_string(),
        FieldDef::required_decimal(Some(Decimal::ZERO)),
    );
    fields.insert(
        "type".to_string(),
        FieldDef::enumeration(enum_values(TransactionType::ALL, TransactionType::as_str), true)
            .describe("must be a valid transaction type"),
    );
    fields.insert(
        "status".to_string(),
        FieldDef::enumeration(
            enum_values(TransactionStatus::ALL, TransactionStatus::as_str),
            true,
        )
        .describe("must be a valid status"),
    );
    fields.insert(
        "description".to_string(),
        FieldDef::optional_bounded_string(None, Some(DESCRIPTION_MAX_LEN)),
    );
    fields.insert("createdAt".to_string(), FieldDef::required_date());

    CollectionPlan::new(Schema::new(TRANSACTIONS, SCHEMA_VERSION, fields).open())
        .index(IndexSpec::ascending("userId"))
        .index(IndexSpec::ascending("status"))
        .index(IndexSpec::ascending("type"))
        .index(IndexSpec::descending("createdAt"))
        .index(IndexSpec::new(vec![
            IndexField::asc("userId"),
            IndexField::desc("createdAt"),
        ]))
}

fn wallets() -> CollectionPlan {
    let mut fields = BTreeMap::new();
    fields.insert("userId".to_string(), FieldDef::required_object_id());
    fields.insert(
        "balance".to_string(),
        FieldDef::required_decimal(Some(Decimal::ZERO)),
    );
    fields.insert(
        "currency".to_string(),
        FieldDef::enumeration(enum_values(Currency::ALL, Currency::as_str), true)
            .describe("must be a valid currency code"),
    );
    fields.insert("isActive".to_string(), FieldDef::optional_bool());
    fields.insert("createdAt".to_string(), FieldDef::required_date());
    fields.insert("updatedAt".to_string(), FieldDef::optional_date());

    CollectionPlan::new(Schema::new(WALLETS, SCHEMA_VERSION, fields).open())
        .index(IndexSpec::ascending("userId").unique())
        .index(IndexSpec::ascending("isActive"))
}

fn payment_methods() -> CollectionPlan {
    let mut fields = BTreeMap::new();
    fields.insert("userId".to_string(), FieldDef::required_object_id());
    fields.insert(
        "type".to_string(),
        FieldDef::enumeration(
            enum_values(PaymentMethodType::ALL, PaymentMethodType::as_str),
            true,
        )
        .describe("must be a valid payment method type"),
    );
    fields.insert("isActive".to_string(), FieldDef::required_bool());
    fields.insert("createdAt".to_string(), FieldDef::required_date());

    CollectionPlan::new(Schema::new(PAYMENT_METHODS, SCHEMA_VERSION, fields).open())
        .index(IndexSpec::ascending("userId"))
        .index(IndexSpec::ascending("isActive"))
        .index(IndexSpec::ascending("type"))
}

fn seed_users() -> Vec<Value> {
    vec![
        User::new("John", "Doe", "john.doe@example.com", "+1234567890").to_document(),
        User::new("Jane", "Smith", "jane.smith@example.com", "+1234567891").to_document(),
    ]
}
