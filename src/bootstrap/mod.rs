//! Schema initializer
//!
//! Applies a declarative [`BootstrapPlan`] to an explicitly passed
//! [`Server`](crate::db::Server): database, validated collections, indexes
//! and seed data, then reports.
//!
//! ```ignore
//! let mut server = Server::open("./data")?;
//! let report = SchemaInitializer::new().initialize(&mut server)?;
//! for line in report.status_lines() {
//!     println!("{}", line);
//! }
//! ```

mod errors;
mod gpay;
mod initializer;
mod plan;

pub use errors::{InitError, InitResult};
pub use gpay::{
    gpay_plan, DEFAULT_DATABASE, EMAIL_PATTERN, PAYMENT_METHODS, PHONE_PATTERN, SCHEMA_VERSION,
    TRANSACTIONS, USERS, WALLETS,
};
pub use initializer::{InitReport, SchemaInitializer};
pub use plan::{BootstrapPlan, CollectionPlan, RerunPolicy, SeedBatch};
