//! The dynamic value representation and its shape classification

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::store::{ListHandle, ObjectHandle, ResultsHandle};

/// A dynamically-typed value
///
/// Wrapped variants are live views over store state, not copies; cloning
/// them clones the view, not the data.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Explicit null marker
    Null,
    /// Boolean scalar
    Bool(bool),
    /// 64-bit integer scalar
    Int(i64),
    /// 64-bit float scalar
    Float(f64),
    /// UTF-8 string scalar
    Str(String),
    /// Binary scalar
    Bytes(Vec<u8>),
    /// UTC timestamp scalar
    Timestamp(DateTime<Utc>),
    /// Indexed container
    Array(Vec<Dynamic>),
    /// Keyed container
    Map(BTreeMap<String, Dynamic>),
    /// Wrapped persisted object
    Object(ObjectHandle),
    /// Wrapped live list
    List(ListHandle),
    /// Wrapped live query results
    Results(ResultsHandle),
}

/// Coarse shape of a dynamic value, resolved once per value
///
/// Coercion functions dispatch on this classification; they never probe
/// variants individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Null marker
    Null,
    /// Any scalar (bool, int, float, string, bytes, timestamp)
    Scalar,
    /// Array-like element access
    Indexed,
    /// Key-based lookup
    Keyed,
    /// Already-wrapped persisted object
    WrappedObject,
    /// Already-wrapped live list
    WrappedList,
    /// Already-wrapped query results
    WrappedResults,
}

impl Dynamic {
    /// Returns the shape of this value
    pub fn shape(&self) -> Shape {
        match self {
            Dynamic::Null => Shape::Null,
            Dynamic::Bool(_)
            | Dynamic::Int(_)
            | Dynamic::Float(_)
            | Dynamic::Str(_)
            | Dynamic::Bytes(_)
            | Dynamic::Timestamp(_) => Shape::Scalar,
            Dynamic::Array(_) => Shape::Indexed,
            Dynamic::Map(_) => Shape::Keyed,
            Dynamic::Object(_) => Shape::WrappedObject,
            Dynamic::List(_) => Shape::WrappedList,
            Dynamic::Results(_) => Shape::WrappedResults,
        }
    }

    /// Returns the value's type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::Str(_) => "string",
            Dynamic::Bytes(_) => "bytes",
            Dynamic::Timestamp(_) => "timestamp",
            Dynamic::Array(_) => "array",
            Dynamic::Map(_) => "map",
            Dynamic::Object(_) => "object",
            Dynamic::List(_) => "list",
            Dynamic::Results(_) => "results",
        }
    }

    /// Whether this is the null marker
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }
}

impl From<bool> for Dynamic {
    fn from(v: bool) -> Self {
        Dynamic::Bool(v)
    }
}

impl From<i64> for Dynamic {
    fn from(v: i64) -> Self {
        Dynamic::Int(v)
    }
}

impl From<f64> for Dynamic {
    fn from(v: f64) -> Self {
        Dynamic::Float(v)
    }
}

impl From<&str> for Dynamic {
    fn from(v: &str) -> Self {
        Dynamic::Str(v.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(v: String) -> Self {
        Dynamic::Str(v)
    }
}

impl From<Vec<u8>> for Dynamic {
    fn from(v: Vec<u8>) -> Self {
        Dynamic::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Dynamic {
    fn from(v: DateTime<Utc>) -> Self {
        Dynamic::Timestamp(v)
    }
}
