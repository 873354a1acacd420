//! CLI command implementations
//!
//! Both commands are one-shot: build state, do the work, print JSON
//! results to stdout, exit. The store is in-memory, so `import` prints
//! the stored objects back out as its observable result.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::accessor::AccessorContext;
use crate::config::StoreConfig;
use crate::observability::Logger;
use crate::schema::SchemaRegistry;
use crate::store::Store;
use crate::value::Dynamic;

use super::args::{Cli, Command};
use super::errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and dispatch to the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::CheckSchemas { dir } => check_schemas(&dir),
        Command::Import {
            schemas,
            type_name,
            file,
            update,
            config,
        } => import(&schemas, &type_name, &file, update, config.as_deref()),
    }
}

/// Load a schema directory and verify cross-schema links
fn check_schemas(dir: &Path) -> CliResult<()> {
    let mut registry = SchemaRegistry::new();
    let loaded = registry.load_dir(dir)?;
    registry.validate_links()?;

    let mut names: Vec<&str> = registry.names().collect();
    names.sort_unstable();
    print_json(&serde_json::json!({
        "loaded": loaded,
        "types": names,
    }));
    Ok(())
}

/// Insert JSON documents through the accessor and print the stored objects
fn import(
    schemas: &Path,
    type_name: &str,
    file: &Path,
    update: bool,
    config: Option<&Path>,
) -> CliResult<()> {
    let config = match config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };

    let mut registry = SchemaRegistry::new();
    registry.load_dir(schemas)?;
    let store = Store::open(registry, config)?;

    let documents = read_documents(file)?;
    let mut txn = store.begin_write();

    let mut rows = Vec::with_capacity(documents.len());
    for document in documents {
        // One context per insertion: the default cache (generated ids
        // included) is scoped to a single operation
        let ctx = AccessorContext::for_insert(&store, type_name, !update)?;
        let row = ctx.insert(&mut txn, &Dynamic::from_json(document))?;
        rows.push(row);
    }
    txn.commit();
    Logger::info(
        "cli.import",
        &[("type", type_name), ("count", &rows.len().to_string())],
    );

    for handle in store.objects(type_name)?.handles()? {
        print_json(&handle.snapshot_json()?);
    }
    Ok(())
}

/// Reads one JSON document, or an array of documents, from a file
fn read_documents(path: &Path) -> CliResult<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    let parsed: Value = serde_json::from_str(&content)?;
    match parsed {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![parsed]),
        other => Err(CliError::new(
            CliErrorCode::IoError,
            format!(
                "expected a JSON document or array of documents, got {}",
                Dynamic::from_json(other).type_name()
            ),
        )),
    }
}

/// Prints one JSON value per line
fn print_json(value: &Value) {
    println!("{}", value);
}

/// Convenience used by integration tests: import documents already in
/// memory against an open store
pub fn import_documents(
    store: &Store,
    type_name: &str,
    documents: Vec<Value>,
    update: bool,
) -> CliResult<Vec<usize>> {
    let mut txn = store.begin_write();
    let mut rows = Vec::with_capacity(documents.len());
    for document in documents {
        let ctx = AccessorContext::for_insert(store, type_name, !update)?;
        rows.push(ctx.insert(&mut txn, &Dynamic::from_json(document))?);
    }
    txn.commit();
    Ok(rows)
}
