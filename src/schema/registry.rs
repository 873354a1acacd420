//! Schema registry
//!
//! Holds every registered object schema, keyed by type name. Schemas are
//! registered in code or loaded from a directory of JSON schema files at
//! startup; once registered they are immutable. Link targets are checked
//! across the whole registry before a store is built on top of it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::observability::{log_event, Event};

use super::errors::{SchemaError, SchemaResult};
use super::types::ObjectSchema;

/// In-memory registry of object schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Registered schemas indexed by type name
    schemas: HashMap<String, ObjectSchema>,
}

impl SchemaRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registers a schema, validating its structure first.
    ///
    /// Re-registering a type name is rejected; schemas are immutable.
    pub fn register(&mut self, schema: ObjectSchema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|detail| SchemaError::invalid_schema(&schema.name, detail))?;

        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::schema_exists(&schema.name));
        }

        log_event(
            Event::SchemaRegistered,
            &[("type", &schema.name), ("version", &schema.version)],
        );
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Returns the schema for a type name, if registered
    pub fn get(&self, name: &str) -> Option<&ObjectSchema> {
        self.schemas.get(name)
    }

    /// Returns the schema for a type name, or an unknown-schema error
    pub fn require(&self, name: &str) -> SchemaResult<&ObjectSchema> {
        self.get(name).ok_or_else(|| SchemaError::unknown_schema(name))
    }

    /// Registered type names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Consumes the registry, yielding its schemas
    pub(crate) fn into_schemas(self) -> HashMap<String, ObjectSchema> {
        self.schemas
    }

    /// Loads every `*.json` schema file from a directory.
    ///
    /// Returns the number of schemas loaded. Unreadable or malformed files
    /// are fatal; a missing directory loads nothing.
    pub fn load_dir(&mut self, dir: &Path) -> SchemaResult<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            SchemaError::malformed_schema_file(dir.display(), format!("unreadable directory: {}", e))
        })?;

        let mut paths: Vec<_> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_schema_file(dir.display(), format!("unreadable entry: {}", e))
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        // Deterministic load order regardless of directory iteration order
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            self.load_schema_file(&path)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Loads a single schema file
    fn load_schema_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema_file(path.display(), format!("unreadable file: {}", e))
        })?;

        let schema: ObjectSchema = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema_file(path.display(), format!("invalid JSON: {}", e))
        })?;

        self.register(schema)
    }

    /// Checks that every object and list property links to a registered type
    pub fn validate_links(&self) -> SchemaResult<()> {
        for schema in self.schemas.values() {
            for prop in &schema.properties {
                if let Some(target) = prop.kind.link_target() {
                    if !self.schemas.contains_key(target) {
                        return Err(SchemaError::invalid_schema(
                            &schema.name,
                            format!(
                                "property '{}' links to unregistered type '{}'",
                                prop.name, target
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
