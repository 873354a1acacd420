//! Typed storage cells
//!
//! A row is a vector of columns, one per schema property, in property
//! order. Link columns hold row indices into the target type's table.

use std::fmt;

use chrono::{DateTime, Utc};

/// A single typed storage cell
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Storage default for optional scalars and unset links
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Binary data
    Data(Vec<u8>),
    /// UTC timestamp
    Date(DateTime<Utc>),
    /// Link to one row of the property's target type
    Link(usize),
    /// Links to many rows of the property's target type
    LinkList(Vec<usize>),
}

impl Column {
    /// Returns the cell's kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Column::Null => "null",
            Column::Bool(_) => "bool",
            Column::Int(_) => "int",
            Column::Float(_) => "float",
            Column::Double(_) => "double",
            Column::String(_) => "string",
            Column::Data(_) => "data",
            Column::Date(_) => "date",
            Column::Link(_) => "link",
            Column::LinkList(_) => "linklist",
        }
    }
}

/// A primary-key value
///
/// Only int and string properties are keyable; the schema layer enforces
/// that, so these two variants are exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PkValue {
    /// Integer key
    Int(i64),
    /// String key
    Str(String),
}

impl fmt::Display for PkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PkValue::Int(v) => write!(f, "{}", v),
            PkValue::Str(v) => write!(f, "'{}'", v),
        }
    }
}

impl PkValue {
    /// Renders the key as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PkValue::Int(v) => serde_json::Value::from(*v),
            PkValue::Str(v) => serde_json::Value::String(v.clone()),
        }
    }
}
