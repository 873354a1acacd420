//! The coercion table
//!
//! Bidirectional conversions between storage primitives and dynamic
//! values, plus collection introspection and object-index resolution.
//! Every function dispatches on the value's resolved shape; cross-type
//! scalar coercion is rejected rather than guessed, with two carrier
//! exceptions: base64 text for binary and RFC 3339 text for timestamps,
//! since JSON has neither type natively.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::schema::Property;
use crate::store::{
    Column, ListHandle, ObjectHandle, ResultsHandle, ValueAccessor, WriteTxn,
};
use crate::value::{Dynamic, Shape};

use super::context::AccessorContext;
use super::errors::{AccessorError, AccessorResult};

/// Largest magnitude at which every f64 still maps to a distinct i64
const I64_RANGE: f64 = 9_223_372_036_854_775_808.0; // 2^63

/// Null across both of its spellings: an absent value and the explicit
/// null marker
pub fn is_null_or_absent(value: Option<&Dynamic>) -> bool {
    value.map_or(true, Dynamic::is_null)
}

impl ValueAccessor for AccessorContext<'_> {
    type Value = Dynamic;

    fn value_for_property(
        &self,
        source: &Dynamic,
        object_type: &str,
        prop: &Property,
        _index: usize,
    ) -> AccessorResult<Option<Dynamic>> {
        if let Some(value) = self.dict_value_for_key(source, &prop.name)? {
            return Ok(Some(value));
        }
        self.default_for(object_type, &prop.name)
    }

    fn is_null(&self, value: &Dynamic) -> bool {
        value.is_null()
    }

    fn null_value(&self) -> Dynamic {
        Dynamic::Null
    }

    fn to_bool(&self, value: &Dynamic) -> AccessorResult<bool> {
        match value {
            Dynamic::Bool(v) => Ok(*v),
            other => Err(AccessorError::mismatch("bool", other.type_name())),
        }
    }

    fn to_long(&self, value: &Dynamic) -> AccessorResult<i64> {
        match value {
            Dynamic::Int(v) => Ok(*v),
            // Integral doubles pass through; anything fractional or out
            // of range would truncate, so it is a mismatch
            Dynamic::Float(f) if f.fract() == 0.0 && *f >= -I64_RANGE && *f < I64_RANGE => {
                Ok(*f as i64)
            }
            other => Err(AccessorError::mismatch("int", other.type_name())),
        }
    }

    fn to_float(&self, value: &Dynamic) -> AccessorResult<f32> {
        match value {
            Dynamic::Int(v) => Ok(*v as f32),
            // The declared storage width is 32 bits; narrowing here is
            // the documented behavior of a float property
            Dynamic::Float(v) => Ok(*v as f32),
            other => Err(AccessorError::mismatch("float", other.type_name())),
        }
    }

    fn to_double(&self, value: &Dynamic) -> AccessorResult<f64> {
        match value {
            Dynamic::Int(v) => Ok(*v as f64),
            Dynamic::Float(v) => Ok(*v),
            other => Err(AccessorError::mismatch("double", other.type_name())),
        }
    }

    fn to_string(&self, value: &Dynamic) -> AccessorResult<String> {
        match value {
            Dynamic::Str(v) => Ok(v.clone()),
            other => Err(AccessorError::mismatch("string", other.type_name())),
        }
    }

    fn to_binary(&self, value: &Dynamic) -> AccessorResult<Vec<u8>> {
        match value {
            Dynamic::Bytes(v) => Ok(v.clone()),
            // JSON carries binary as base64 text
            Dynamic::Str(v) => BASE64
                .decode(v)
                .map_err(|_| AccessorError::mismatch("base64 data", "string")),
            other => Err(AccessorError::mismatch("data", other.type_name())),
        }
    }

    fn to_timestamp(&self, value: &Dynamic) -> AccessorResult<DateTime<Utc>> {
        match value {
            Dynamic::Timestamp(v) => Ok(*v),
            // JSON carries timestamps as RFC 3339 text
            Dynamic::Str(v) => DateTime::parse_from_rfc3339(v)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| AccessorError::mismatch("RFC 3339 timestamp", "string")),
            other => Err(AccessorError::mismatch("date", other.type_name())),
        }
    }

    fn to_mixed(&self, _value: &Dynamic) -> AccessorResult<Column> {
        Err(AccessorError::unsupported())
    }

    fn from_bool(&self, value: bool) -> Dynamic {
        Dynamic::Bool(value)
    }

    fn from_long(&self, value: i64) -> Dynamic {
        Dynamic::Int(value)
    }

    fn from_float(&self, value: f32) -> Dynamic {
        Dynamic::Float(f64::from(value))
    }

    fn from_double(&self, value: f64) -> Dynamic {
        Dynamic::Float(value)
    }

    fn from_string(&self, value: String) -> Dynamic {
        Dynamic::Str(value)
    }

    fn from_binary(&self, value: Vec<u8>) -> Dynamic {
        Dynamic::Bytes(value)
    }

    fn from_timestamp(&self, value: DateTime<Utc>) -> Dynamic {
        Dynamic::Timestamp(value)
    }

    fn from_object(&self, handle: ObjectHandle) -> Dynamic {
        self.wrap_object(handle)
    }

    fn from_list(&self, handle: ListHandle) -> Dynamic {
        self.wrap_list(handle)
    }

    fn from_results(&self, handle: ResultsHandle) -> Dynamic {
        self.wrap_results(handle)
    }

    fn list_size(&self, value: &Dynamic) -> AccessorResult<usize> {
        match value {
            Dynamic::Array(items) => Ok(items.len()),
            Dynamic::List(handle) => handle.len(),
            other => Err(AccessorError::mismatch("a list", other.type_name())),
        }
    }

    fn list_value_at_index(&self, value: &Dynamic, index: usize) -> AccessorResult<Dynamic> {
        match value {
            Dynamic::Array(items) => {
                items
                    .get(index)
                    .cloned()
                    .ok_or(AccessorError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    })
            }
            Dynamic::List(handle) => Ok(Dynamic::Object(handle.get(index)?)),
            other => Err(AccessorError::mismatch("a list", other.type_name())),
        }
    }

    fn dict_has_value_for_key(&self, value: &Dynamic, key: &str) -> AccessorResult<bool> {
        match value {
            Dynamic::Map(map) => Ok(map.contains_key(key)),
            Dynamic::Object(handle) => {
                let schema = self.store().schema(handle.type_name())?;
                Ok(schema.property(key).is_some())
            }
            other => Err(AccessorError::mismatch(
                "a keyed container",
                other.type_name(),
            )),
        }
    }

    fn dict_value_for_key(&self, value: &Dynamic, key: &str) -> AccessorResult<Option<Dynamic>> {
        match value {
            Dynamic::Map(map) => Ok(map.get(key).cloned()),
            Dynamic::Object(handle) => {
                let schema = self.store().schema(handle.type_name())?;
                match schema.property(key) {
                    Some((index, _)) => Ok(Some(crate::store::property_value(
                        self,
                        self.store(),
                        handle.type_name(),
                        handle.row(),
                        index,
                    )?)),
                    None => Ok(None),
                }
            }
            other => Err(AccessorError::mismatch(
                "a keyed container",
                other.type_name(),
            )),
        }
    }

    fn has_default_value_for_property(
        &self,
        object_type: &str,
        property: &str,
    ) -> AccessorResult<bool> {
        let schema = self.store().schema(object_type)?;
        Ok(schema
            .property(property)
            .map_or(false, |(_, prop)| prop.has_default()))
    }

    fn default_value_for_property(
        &self,
        object_type: &str,
        property: &str,
    ) -> AccessorResult<Option<Dynamic>> {
        self.default_for(object_type, property)
    }

    fn to_object_index(
        &self,
        txn: &mut WriteTxn<'_>,
        value: &Dynamic,
        object_type: &str,
        is_update: bool,
    ) -> AccessorResult<usize> {
        match value {
            Dynamic::Object(handle) => self.reuse_handle(handle, object_type),
            v if v.shape() == Shape::Keyed => self.add_object(txn, v, object_type, is_update),
            other => Err(AccessorError::mismatch(
                format!("'{}' object or keyed container", object_type),
                other.type_name(),
            )),
        }
    }

    fn to_existing_object_index(
        &self,
        value: &Dynamic,
        object_type: &str,
    ) -> AccessorResult<usize> {
        if let Dynamic::Object(handle) = value {
            return self.reuse_handle(handle, object_type);
        }

        let schema = self.store().schema(object_type)?;
        // Without a primary key nothing but a wrapped object can name an
        // identity, so the lookup always fails
        let Some((_, pk_prop)) = schema.primary_key_property() else {
            return Err(AccessorError::IdentityNotFound {
                object_type: object_type.to_string(),
                key: "<no primary key>".to_string(),
            });
        };

        // Accept the key itself, or a keyed container carrying the key
        // property
        let key_value = match value.shape() {
            Shape::Keyed => self
                .dict_value_for_key(value, &pk_prop.name)?
                .ok_or_else(|| {
                    AccessorError::missing().with_property(object_type, &pk_prop.name)
                })?,
            _ => value.clone(),
        };
        let key = self
            .pk_from_dynamic(&key_value, pk_prop)
            .map_err(|e| e.with_property(object_type, &pk_prop.name))?;

        match self.store().find_by_primary_key(object_type, &key)? {
            Some(row) => Ok(row),
            None => Err(AccessorError::IdentityNotFound {
                object_type: object_type.to_string(),
                key: key.to_string(),
            }),
        }
    }
}
