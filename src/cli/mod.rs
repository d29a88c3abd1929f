//! CLI module for gpaydb
//!
//! Provides command-line interface for:
//! - init: Apply the GPay bootstrap plan
//! - insert: Validated single-document write
//! - find: Equality lookup
//! - stats: Collections, indexes and counters

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{find, init, insert, run, run_command, stats, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_document, write_error, write_lines, write_response};
