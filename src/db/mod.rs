//! Database engine
//!
//! A `Server` owns a data directory; each `Database` below it keeps its own
//! schemas, catalog and record file:
//!
//! ```text
//! <data_dir>/LOCK
//! <data_dir>/<db>/metadata/catalog.json
//! <data_dir>/<db>/metadata/schemas/<id>/<version>.json
//! <data_dir>/<db>/data/documents.dat
//! ```

mod catalog;
mod collection;
mod database;
mod errors;
mod server;

pub use catalog::{Catalog, CollectionEntry};
pub use collection::Collection;
pub use database::{CollectionStats, Database, DatabaseStats};
pub use errors::{DbError, DbResult};
pub use server::Server;
