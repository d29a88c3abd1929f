//! CLI argument definitions using clap
//!
//! Commands:
//! - gpaydb init [--config <path>] [--json]
//! - gpaydb insert --collection <name> [--config <path>]
//! - gpaydb find --collection <name> --field <field> --value <json> [--config <path>]
//! - gpaydb stats [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gpaydb - schema-validated document store with the GPay initializer
#[derive(Parser, Debug)]
#[command(name = "gpaydb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the GPay database, collections, indexes and sample users
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./gpaydb.json")]
        config: PathBuf,

        /// Print the machine-readable report instead of the status lines
        #[arg(long)]
        json: bool,
    },

    /// Insert one JSON document read from stdin
    Insert {
        /// Path to configuration file
        #[arg(long, default_value = "./gpaydb.json")]
        config: PathBuf,

        /// Target collection
        #[arg(long)]
        collection: String,
    },

    /// Print every document whose field equals the given value
    Find {
        /// Path to configuration file
        #[arg(long, default_value = "./gpaydb.json")]
        config: PathBuf,

        #[arg(long)]
        collection: String,

        #[arg(long)]
        field: String,

        /// JSON value; anything that is not valid JSON is taken as a string
        #[arg(long)]
        value: String,
    },

    /// Print collections, index names, document counts and counters
    Stats {
        /// Path to configuration file
        #[arg(long, default_value = "./gpaydb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
