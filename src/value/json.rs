//! JSON interop for dynamic values
//!
//! JSON has no binary or timestamp type, so the carrier forms are base64
//! text and RFC 3339 text. Conversion from JSON never guesses at those
//! forms; schema-driven coercion decodes them where a property's declared
//! kind calls for it.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use super::Dynamic;

impl Dynamic {
    /// Converts a JSON value into its dynamic representation
    pub fn from_json(value: Value) -> Dynamic {
        match value {
            Value::Null => Dynamic::Null,
            Value::Bool(b) => Dynamic::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Dynamic::Int(i)
                } else {
                    // u64 beyond i64 range and all fractional numbers
                    Dynamic::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Dynamic::Str(s),
            Value::Array(items) => {
                Dynamic::Array(items.into_iter().map(Dynamic::from_json).collect())
            }
            Value::Object(entries) => {
                let map: BTreeMap<String, Dynamic> = entries
                    .into_iter()
                    .map(|(k, v)| (k, Dynamic::from_json(v)))
                    .collect();
                Dynamic::Map(map)
            }
        }
    }

    /// Converts this value back into JSON.
    ///
    /// Wrapped objects render as their primary-key reference (or row
    /// reference when the schema has no key) so cyclic graphs terminate;
    /// wrapped lists and results render as arrays of those references.
    pub fn to_json(&self) -> Value {
        match self {
            Dynamic::Null => Value::Null,
            Dynamic::Bool(b) => Value::Bool(*b),
            Dynamic::Int(i) => Value::from(*i),
            Dynamic::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
            Dynamic::Str(s) => Value::String(s.clone()),
            Dynamic::Bytes(b) => Value::String(BASE64.encode(b)),
            Dynamic::Timestamp(t) => Value::String(t.to_rfc3339()),
            Dynamic::Array(items) => Value::Array(items.iter().map(Dynamic::to_json).collect()),
            Dynamic::Map(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                Value::Object(entries)
            }
            Dynamic::Object(handle) => handle.reference_json(),
            Dynamic::List(handle) => handle.reference_json(),
            Dynamic::Results(handle) => handle.reference_json(),
        }
    }
}
