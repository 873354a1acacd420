//! Per-type row storage
//!
//! Rows live in slot vectors; a row index is stable for the life of the
//! store and deletion tombstones the slot rather than shifting later rows.

use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::AccessorError;
use crate::schema::ObjectSchema;

use super::column::{Column, PkValue};

/// Row storage for one object type
#[derive(Debug)]
pub(crate) struct Table {
    /// The immutable schema this table stores rows for
    pub(crate) schema: Arc<ObjectSchema>,
    /// Row slots; `None` marks a tombstoned row
    rows: Vec<Option<Vec<Column>>>,
    /// Primary-key index over live rows
    pk_index: HashMap<PkValue, usize>,
}

impl Table {
    /// Creates an empty table for a schema
    pub fn new(schema: ObjectSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            rows: Vec::new(),
            pk_index: HashMap::new(),
        }
    }

    /// Allocates a fresh row with every column at its storage default.
    ///
    /// Registers the primary key immediately so nested insertions inside
    /// the same transaction observe it.
    pub fn allocate(&mut self, pk: Option<PkValue>) -> Result<usize, AccessorError> {
        if let Some(key) = &pk {
            if self.pk_index.contains_key(key) {
                return Err(AccessorError::DuplicateKey {
                    object_type: self.schema.name.clone(),
                    key: key.to_string(),
                });
            }
        }

        let row = self.rows.len();
        self.rows
            .push(Some(vec![Column::Null; self.schema.properties.len()]));
        if let Some(key) = pk {
            self.pk_index.insert(key, row);
        }
        Ok(row)
    }

    /// Whether a row slot is live
    pub fn is_live(&self, row: usize) -> bool {
        matches!(self.rows.get(row), Some(Some(_)))
    }

    /// Reads one column of a live row
    pub fn column(&self, row: usize, index: usize) -> Option<&Column> {
        self.rows.get(row)?.as_ref()?.get(index)
    }

    /// Writes one column of a live row; false if the row is dead
    pub fn set_column(&mut self, row: usize, index: usize, column: Column) -> bool {
        match self.rows.get_mut(row).and_then(Option::as_mut) {
            Some(columns) if index < columns.len() => {
                columns[index] = column;
                true
            }
            _ => false,
        }
    }

    /// Snapshot of a live row's columns
    pub fn snapshot(&self, row: usize) -> Option<Vec<Column>> {
        self.rows.get(row)?.clone()
    }

    /// Restores a row's columns from a snapshot
    pub fn restore(&mut self, row: usize, columns: Vec<Column>) {
        if let Some(slot) = self.rows.get_mut(row) {
            *slot = Some(columns);
        }
    }

    /// Tombstones a row, dropping its primary key from the index.
    ///
    /// The index is swept by row rather than by key: a rolled-back row
    /// may die before its key column was ever written.
    pub fn delete(&mut self, row: usize) {
        if self.rows.get_mut(row).and_then(Option::take).is_some() {
            self.pk_index.retain(|_, live| *live != row);
        }
    }

    /// Finds the live row holding a primary key
    pub fn find_pk(&self, key: &PkValue) -> Option<usize> {
        self.pk_index.get(key).copied()
    }

    /// Indices of live rows, in allocation order
    pub fn live_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
            .collect()
    }

    /// Number of live rows
    pub fn live_count(&self) -> usize {
        self.rows.iter().filter(|slot| slot.is_some()).count()
    }
}
