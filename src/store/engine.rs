//! The store: schema-bound tables behind shared handles
//!
//! A `Store` is cheap to clone; clones share state. Handles hold a clone
//! and read through it on every access, so wrapped values always reflect
//! live storage state. Mutation goes through `WriteTxn` only.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::accessor::{AccessorError, AccessorResult};
use crate::config::StoreConfig;
use crate::observability::{log_event, Event};
use crate::schema::{ObjectSchema, SchemaRegistry, SchemaResult};

use super::column::{Column, PkValue};
use super::handle::{ObjectHandle, ResultsHandle};
use super::table::Table;
use super::txn::WriteTxn;

/// A schema-driven, in-memory object store
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
    config: Arc<StoreConfig>,
}

#[derive(Debug)]
struct StoreInner {
    tables: HashMap<String, Table>,
}

impl Store {
    /// Opens a store over a registry, one table per registered schema.
    ///
    /// Fails if any schema links to an unregistered type.
    pub fn open(registry: SchemaRegistry, config: StoreConfig) -> SchemaResult<Self> {
        registry.validate_links()?;
        let tables: HashMap<String, Table> = registry
            .into_schemas()
            .into_iter()
            .map(|(name, schema)| (name, Table::new(schema)))
            .collect();

        log_event(Event::StoreOpened, &[("types", &tables.len().to_string())]);
        Ok(Self {
            inner: Arc::new(RwLock::new(StoreInner { tables })),
            config: Arc::new(config),
        })
    }

    /// The store's configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Begins a write transaction
    pub fn begin_write(&self) -> WriteTxn<'_> {
        WriteTxn::new(self)
    }

    /// Whether two store values share state
    pub(crate) fn same_store(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> AccessorResult<RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| AccessorError::Internal("store lock poisoned".into()))
    }

    fn write(&self) -> AccessorResult<RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| AccessorError::Internal("store lock poisoned".into()))
    }

    /// The schema for a type name
    pub fn schema(&self, type_name: &str) -> AccessorResult<Arc<ObjectSchema>> {
        let guard = self.read()?;
        guard
            .tables
            .get(type_name)
            .map(|table| table.schema.clone())
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        match self.read() {
            Ok(guard) => {
                let mut names: Vec<String> = guard.tables.keys().cloned().collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }

    /// Whether a row slot is live
    pub fn is_live(&self, type_name: &str, row: usize) -> AccessorResult<bool> {
        let guard = self.read()?;
        let table = guard
            .tables
            .get(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        Ok(table.is_live(row))
    }

    /// Reads one column of a live row
    pub fn column(&self, type_name: &str, row: usize, index: usize) -> AccessorResult<Column> {
        let guard = self.read()?;
        let table = guard
            .tables
            .get(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        if !table.is_live(row) {
            return Err(AccessorError::DeadObject {
                object_type: type_name.to_string(),
                row,
            });
        }
        table.column(row, index).cloned().ok_or_else(|| {
            AccessorError::Internal(format!(
                "column {} out of range for '{}'",
                index, type_name
            ))
        })
    }

    /// Finds the live row holding a primary key
    pub fn find_by_primary_key(
        &self,
        type_name: &str,
        key: &PkValue,
    ) -> AccessorResult<Option<usize>> {
        let guard = self.read()?;
        let table = guard
            .tables
            .get(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        Ok(table.find_pk(key))
    }

    /// Number of live objects of a type
    pub fn live_count(&self, type_name: &str) -> AccessorResult<usize> {
        let guard = self.read()?;
        let table = guard
            .tables
            .get(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        Ok(table.live_count())
    }

    /// Indices of live rows of a type, in allocation order
    pub fn live_rows(&self, type_name: &str) -> AccessorResult<Vec<usize>> {
        let guard = self.read()?;
        let table = guard
            .tables
            .get(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        Ok(table.live_rows())
    }

    /// A live handle to one object
    pub fn get(&self, type_name: &str, row: usize) -> AccessorResult<ObjectHandle> {
        if !self.is_live(type_name, row)? {
            return Err(AccessorError::DeadObject {
                object_type: type_name.to_string(),
                row,
            });
        }
        Ok(ObjectHandle::new(self.clone(), type_name, row))
    }

    /// A live handle to all objects of a type
    pub fn objects(&self, type_name: &str) -> AccessorResult<ResultsHandle> {
        self.schema(type_name)?;
        Ok(ResultsHandle::new(self.clone(), type_name))
    }

    // --- mutation, reachable only through WriteTxn ---

    pub(crate) fn allocate_row(
        &self,
        type_name: &str,
        pk: Option<PkValue>,
    ) -> AccessorResult<usize> {
        let mut guard = self.write()?;
        let table = guard
            .tables
            .get_mut(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        table.allocate(pk)
    }

    pub(crate) fn set_column(
        &self,
        type_name: &str,
        row: usize,
        index: usize,
        column: Column,
    ) -> AccessorResult<()> {
        let mut guard = self.write()?;
        let table = guard
            .tables
            .get_mut(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        if table.set_column(row, index, column) {
            Ok(())
        } else {
            Err(AccessorError::DeadObject {
                object_type: type_name.to_string(),
                row,
            })
        }
    }

    pub(crate) fn row_snapshot(&self, type_name: &str, row: usize) -> AccessorResult<Vec<Column>> {
        let guard = self.read()?;
        let table = guard
            .tables
            .get(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        table.snapshot(row).ok_or(AccessorError::DeadObject {
            object_type: type_name.to_string(),
            row,
        })
    }

    pub(crate) fn restore_row(
        &self,
        type_name: &str,
        row: usize,
        columns: Vec<Column>,
    ) -> AccessorResult<()> {
        let mut guard = self.write()?;
        let table = guard
            .tables
            .get_mut(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        table.restore(row, columns);
        Ok(())
    }

    pub(crate) fn delete_row(&self, type_name: &str, row: usize) -> AccessorResult<()> {
        let mut guard = self.write()?;
        let table = guard
            .tables
            .get_mut(type_name)
            .ok_or_else(|| AccessorError::UnknownType {
                name: type_name.to_string(),
            })?;
        table.delete(row);
        Ok(())
    }
}
