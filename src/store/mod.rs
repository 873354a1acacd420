//! Storage engine for heliodb
//!
//! The store holds one table per registered schema: slot vectors of typed
//! columns with a primary-key index. It never interprets dynamic values —
//! the `ValueAccessor` contract is the sole wire between the engine's
//! generic materialization code and the binding above it.
//!
//! # Design Principles
//!
//! - Mutation only through a write transaction with an undo log
//! - Row indices are stable; deletion tombstones, never shifts
//! - Handles are live views over store state, not snapshots
//! - Single-writer, synchronous, no internal locking discipline beyond
//!   interior mutability

mod column;
mod engine;
mod handle;
mod materialize;
mod table;
mod txn;

pub use column::{Column, PkValue};
pub use engine::Store;
pub use handle::{ListHandle, ObjectHandle, ResultsHandle};
pub use materialize::ValueAccessor;
pub use txn::WriteTxn;

pub(crate) use materialize::{property_value, write_properties, write_single};
