//! Schema registry backed by one JSON file per schema version
//!
//! Layout:
//! - Schemas stored at `<db_dir>/metadata/schemas/<id>/<version>.json`
//! - One file per schema version, never rewritten
//! - Versions must be a single plain path component
//! - Malformed schema files fail the database open

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// In-memory registry of schemas, keyed by (schema_id, schema_version).
///
/// Patterns are compiled once at registration and shared by every validation.
pub struct SchemaRegistry {
    /// Directory containing schema files
    schema_dir: PathBuf,
    /// Registered schemas indexed by (schema_id, schema_version)
    schemas: HashMap<(String, String), Schema>,
    /// Compiled regex patterns keyed by source text
    patterns: HashMap<String, Regex>,
}

impl SchemaRegistry {
    /// Creates an empty registry for the given database directory.
    pub fn new(db_dir: &Path) -> Self {
        Self {
            schema_dir: db_dir.join("metadata").join("schemas"),
            schemas: HashMap::new(),
            patterns: HashMap::new(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads all schema files from the schema directory.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.schema_dir.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_schema(
                self.schema_dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    SchemaError::malformed_schema(
                        self.schema_dir.display().to_string(),
                        format!("Failed to read directory entry: {}", e),
                    )
                })?
                .path();
            if path.is_dir() {
                collect_json_files(&path, &mut paths)?;
            } else if is_json(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            self.load_schema_file(&path)?;
        }

        Ok(())
    }

    fn load_schema_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema: Schema = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        self.insert_checked(schema, &path.display().to_string())?;
        Ok(())
    }

    /// Registers a schema in memory.
    ///
    /// Returns `Ok(false)` when an identical schema is already registered.
    /// A different definition under an existing (id, version) is rejected.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<bool> {
        self.insert_checked(schema, "<in-memory>")
    }

    fn insert_checked(&mut self, schema: Schema, origin: &str) -> SchemaResult<bool> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(origin, e))?;

        let key = (schema.schema_id.clone(), schema.schema_version.clone());
        if let Some(existing) = self.schemas.get(&key) {
            if *existing == schema {
                return Ok(false);
            }
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        for pattern in schema.patterns() {
            if !self.patterns.contains_key(pattern) {
                // validate_structure already compiled it once
                let compiled = Regex::new(pattern)
                    .map_err(|e| SchemaError::malformed_schema(origin, e.to_string()))?;
                self.patterns.insert(pattern.to_string(), compiled);
            }
        }

        self.schemas.insert(key, schema);
        Ok(true)
    }

    /// Registers a schema and persists it.
    pub fn register_and_save(&mut self, schema: Schema) -> SchemaResult<bool> {
        let created = self.register(schema.clone())?;
        if created {
            self.save_schema(&schema)?;
        }
        Ok(created)
    }

    pub fn get(&self, schema_id: &str, schema_version: &str) -> Option<&Schema> {
        self.schemas
            .get(&(schema_id.to_string(), schema_version.to_string()))
    }

    pub fn exists(&self, schema_id: &str, schema_version: &str) -> bool {
        self.get(schema_id, schema_version).is_some()
    }

    /// Checks if any version of a schema ID exists.
    pub fn schema_id_exists(&self, schema_id: &str) -> bool {
        self.schemas.keys().any(|(id, _)| id == schema_id)
    }

    /// Returns the compiled form of a registered pattern.
    pub fn pattern(&self, source: &str) -> Option<&Regex> {
        self.patterns.get(source)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Path of the file holding one schema version.
    pub fn schema_path(&self, schema_id: &str, schema_version: &str) -> PathBuf {
        self.schema_dir
            .join(schema_id)
            .join(format!("{}.json", schema_version))
    }

    /// Writes a schema file at the standard location.
    pub fn save_schema(&self, schema: &Schema) -> SchemaResult<PathBuf> {
        for (what, part) in [("id", &schema.schema_id), ("version", &schema.schema_version)] {
            if !is_plain_component(part) {
                return Err(SchemaError::malformed_schema(
                    &schema.schema_id,
                    format!("Schema {} '{}' cannot be used as a file name", what, part),
                ));
            }
        }

        let path = self.schema_path(&schema.schema_id, &schema.schema_version);

        if path.exists() {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        let version_dir = self.schema_dir.join(&schema.schema_id);
        fs::create_dir_all(&version_dir).map_err(|e| {
            SchemaError::malformed_schema(
                version_dir.display().to_string(),
                format!("Failed to create schema directory: {}", e),
            )
        })?;

        let content = serde_json::to_string_pretty(schema).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to serialize schema: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }
}

fn is_json(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "json")
}

fn is_plain_component(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && !part.contains(['/', '\\', '\0'])
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> SchemaResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        SchemaError::malformed_schema(
            dir.display().to_string(),
            format!("Failed to read schema directory: {}", e),
        )
    })?;
    for entry in entries {
        let path = entry
            .map_err(|e| {
                SchemaError::malformed_schema(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?
            .path();
        if is_json(&path) {
            out.push(path);
        }
    }
    Ok(())
}
