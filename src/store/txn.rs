//! Write transactions
//!
//! A `WriteTxn` is the only mutation path into the store. It keeps an undo
//! log: rows it created and pre-images of rows it overwrote. Rollback —
//! explicit or by drop without commit — replays the log in reverse, so a
//! failed object-graph insertion leaves no partial rows behind.
//!
//! Single-writer discipline: one write transaction at a time, on the
//! thread that owns it. The store does not enforce this; the embedding
//! application does, as with any single-writer embedded engine.

use crate::accessor::AccessorResult;
use crate::observability::{log_event, Event};

use super::column::{Column, PkValue};
use super::engine::Store;

enum UndoOp {
    /// Row created by this transaction
    Created { type_name: String, row: usize },
    /// Pre-image of a row this transaction overwrote
    Overwrote {
        type_name: String,
        row: usize,
        columns: Vec<Column>,
    },
}

/// An open write transaction
pub struct WriteTxn<'s> {
    store: &'s Store,
    undo: Vec<UndoOp>,
    committed: bool,
}

impl<'s> WriteTxn<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self {
            store,
            undo: Vec::new(),
            committed: false,
        }
    }

    /// The store this transaction writes to
    pub fn store(&self) -> &Store {
        self.store
    }

    /// Allocates a fresh row, recording it for rollback
    pub(crate) fn allocate(
        &mut self,
        type_name: &str,
        pk: Option<PkValue>,
    ) -> AccessorResult<usize> {
        let row = self.store.allocate_row(type_name, pk)?;
        self.undo.push(UndoOp::Created {
            type_name: type_name.to_string(),
            row,
        });
        Ok(row)
    }

    /// Records a pre-image of a row about to be updated in place
    pub(crate) fn snapshot_for_update(&mut self, type_name: &str, row: usize) -> AccessorResult<()> {
        let columns = self.store.row_snapshot(type_name, row)?;
        self.undo.push(UndoOp::Overwrote {
            type_name: type_name.to_string(),
            row,
            columns,
        });
        Ok(())
    }

    /// Writes one column
    pub(crate) fn set_column(
        &mut self,
        type_name: &str,
        row: usize,
        index: usize,
        column: Column,
    ) -> AccessorResult<()> {
        self.store.set_column(type_name, row, index, column)
    }

    /// Commits the transaction; its writes become permanent
    pub fn commit(mut self) {
        self.committed = true;
        log_event(
            Event::TransactionCommit,
            &[("ops", &self.undo.len().to_string())],
        );
    }

    /// Rolls the transaction back, discarding every row it created and
    /// restoring every row it overwrote
    pub fn rollback(mut self) {
        self.undo_all();
    }

    fn undo_all(&mut self) {
        let ops = self.undo.len();
        for op in self.undo.drain(..).rev() {
            // Undo is best-effort; a poisoned lock here means the process
            // is already unwinding
            match op {
                UndoOp::Created { type_name, row } => {
                    let _ = self.store.delete_row(&type_name, row);
                }
                UndoOp::Overwrote {
                    type_name,
                    row,
                    columns,
                } => {
                    let _ = self.store.restore_row(&type_name, row, columns);
                }
            }
        }
        log_event(Event::TransactionRollback, &[("ops", &ops.to_string())]);
    }
}

impl Drop for WriteTxn<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            self.undo_all();
        }
    }
}
