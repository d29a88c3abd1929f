//! gpaydb - a schema-validated document store and the GPay database initializer
//!
//! - `value`: typed scalar encodings inside JSON documents
//! - `schema`: collection validators and their registry
//! - `index`: ordered secondary indexes with unique enforcement
//! - `storage`: append-only checksummed record file
//! - `db`: server handle, databases, collections and the write path
//! - `models`: typed GPay records
//! - `bootstrap`: the schema initializer and the GPay plan
//! - `observability`: structured logging, events, counters
//! - `cli`: command-line interface

pub mod bootstrap;
pub mod cli;
pub mod db;
pub mod index;
pub mod models;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod value;
