//! Accessor layer for heliodb
//!
//! The bridge between dynamic values and typed storage. A per-operation
//! `AccessorContext` resolves defaults, extracts property values from
//! dynamic sources, wraps storage handles back into dynamic values, and
//! drives object-graph insertion; its `ValueAccessor` implementation is
//! the full coercion table the store's materialization code calls into.
//!
//! # Design Principles
//!
//! - One shape probe per value; coercions dispatch on the result
//! - No implicit cross-type scalar coercion
//! - Conversion failures carry the offending property explicitly
//! - Nested insertion is depth-first, schema-ordered, depth-limited, and
//!   primary-key cycle-safe

mod coercion;
mod context;
mod errors;

pub use coercion::is_null_or_absent;
pub use context::AccessorContext;
pub use errors::{AccessorError, AccessorResult};
