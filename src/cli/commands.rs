//! CLI command implementations
//!
//! Every command loads the config, opens the data directory (taking its
//! lock), does one thing and releases the lock on return.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bootstrap::{gpay_plan, RerunPolicy, SchemaInitializer, DEFAULT_DATABASE};
use crate::db::Server;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_lines, write_response};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Database the initializer and commands operate on (default "gpay_db")
    #[serde(default = "default_database")]
    pub database: String,

    /// Behavior against an already-initialized database (default "reconcile")
    #[serde(default)]
    pub rerun_policy: RerunPolicy,

    /// Whether `init` inserts the sample users (default true)
    #[serde(default = "default_seed")]
    pub seed: bool,

    /// Minimum log severity written to stderr (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}
fn default_seed() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.database.is_empty() {
            return Err(CliError::config_error("database must not be empty"));
        }

        self.severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, json } => init(&config, json),
        Command::Insert { config, collection } => insert(&config, &collection),
        Command::Find {
            config,
            collection,
            field,
            value,
        } => find(&config, &collection, &field, &value),
        Command::Stats { config } => stats(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_dir", &config.data_dir),
            ("database", &config.database),
            ("rerun_policy", config.rerun_policy.as_str()),
        ],
    );
    Ok(config)
}

/// Apply the GPay plan and print the four status lines (or the report).
pub fn init(config_path: &Path, json_output: bool) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut server = Server::open(config.data_path())?;

    let report = SchemaInitializer::with_plan(gpay_plan().for_database(&config.database))
        .policy(config.rerun_policy)
        .seed(config.seed)
        .initialize(&mut server)?;

    if json_output {
        write_response(serde_json::to_value(&report)?)
    } else {
        write_lines(&report.status_lines())
    }
}

/// Insert one document from stdin through the validated write path.
pub fn insert(config_path: &Path, collection: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let doc = read_document()?;

    let mut server = Server::open(config.data_path())?;
    let db = server.database(&config.database)?;
    let id = db.insert_one(collection, doc)?;

    write_response(json!({ "_id": id }))
}

/// Equality lookup on one field.
pub fn find(config_path: &Path, collection: &str, field: &str, raw_value: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let value = parse_value(raw_value);

    let mut server = Server::open(config.data_path())?;
    let db = server.database(&config.database)?;
    let docs: Vec<Value> = db
        .find_eq(collection, field, &value)?
        .into_iter()
        .cloned()
        .collect();

    write_response(Value::Array(docs))
}

/// Collections, index names, document counts and counters.
pub fn stats(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    let mut server = Server::open(config.data_path())?;
    let db = server.database(&config.database)?;

    write_response(serde_json::to_value(db.stats())?)
}

/// `--value` is JSON when it parses, otherwise a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::parse(r#"{"data_dir": "/tmp/gpay"}"#).unwrap();
        assert_eq!(config.database, "gpay_db");
        assert_eq!(config.rerun_policy, RerunPolicy::Reconcile);
        assert!(config.seed);
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::parse(
            r#"{"data_dir": "/tmp/gpay", "database": "gpay_test", "rerun_policy": "strict", "seed": false, "log_level": "warn"}"#,
        )
        .unwrap();
        assert_eq!(config.database, "gpay_test");
        assert_eq!(config.rerun_policy, RerunPolicy::Strict);
        assert!(!config.seed);
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_config_rejections() {
        assert!(Config::parse("{}").is_err());
        assert!(Config::parse(r#"{"data_dir": ""}"#).is_err());
        assert!(Config::parse(r#"{"data_dir": "/d", "rerun_policy": "force"}"#).is_err());
        let err = Config::parse(r#"{"data_dir": "/d", "log_level": "loud"}"#).unwrap_err();
        assert_eq!(err.code_str(), "GPAY_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("\"ACTIVE\""), json!("ACTIVE"));
        assert_eq!(parse_value("ACTIVE"), json!("ACTIVE"));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("{\"$oid\": \"x\"}"), json!({"$oid": "x"}));
    }
}
