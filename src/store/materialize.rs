//! Generic object materialization
//!
//! The store never interprets dynamic values itself. Everything it needs
//! crosses the `ValueAccessor` trait: extraction of a property's value
//! from a source, leaf coercions in both directions, collection and keyed
//! introspection, default lookup, and object-index resolution. The
//! routines here drive that contract in schema property order, for writes
//! (`write_properties`) and reads (`property_value`).

use chrono::{DateTime, Utc};

use crate::accessor::{AccessorError, AccessorResult};
use crate::schema::{ObjectSchema, Property, PropertyKind};

use super::column::Column;
use super::engine::Store;
use super::handle::{ListHandle, ObjectHandle, ResultsHandle};
use super::txn::WriteTxn;

/// The conversion contract between the store and a dynamic value binding
///
/// `to_*` extracts a storage primitive from a dynamic value; `from_*`
/// produces a dynamic value from a storage primitive. `to_object_index`
/// may insert rows as a side effect; nothing else mutates.
pub trait ValueAccessor {
    /// The binding's dynamic value type
    type Value: Clone;

    /// Extracts the value to use for a property from a source object:
    /// the source's own value for the property's key, else the declared
    /// default, else `None`
    fn value_for_property(
        &self,
        source: &Self::Value,
        object_type: &str,
        prop: &Property,
        index: usize,
    ) -> AccessorResult<Option<Self::Value>>;

    /// Whether the value is the null marker
    fn is_null(&self, value: &Self::Value) -> bool;
    /// The canonical null value
    fn null_value(&self) -> Self::Value;

    fn to_bool(&self, value: &Self::Value) -> AccessorResult<bool>;
    fn to_long(&self, value: &Self::Value) -> AccessorResult<i64>;
    fn to_float(&self, value: &Self::Value) -> AccessorResult<f32>;
    fn to_double(&self, value: &Self::Value) -> AccessorResult<f64>;
    fn to_string(&self, value: &Self::Value) -> AccessorResult<String>;
    fn to_binary(&self, value: &Self::Value) -> AccessorResult<Vec<u8>>;
    fn to_timestamp(&self, value: &Self::Value) -> AccessorResult<DateTime<Utc>>;
    /// The any/mixed kind is unsupported and must fail fast
    fn to_mixed(&self, value: &Self::Value) -> AccessorResult<Column>;

    fn from_bool(&self, value: bool) -> Self::Value;
    fn from_long(&self, value: i64) -> Self::Value;
    fn from_float(&self, value: f32) -> Self::Value;
    fn from_double(&self, value: f64) -> Self::Value;
    fn from_string(&self, value: String) -> Self::Value;
    fn from_binary(&self, value: Vec<u8>) -> Self::Value;
    fn from_timestamp(&self, value: DateTime<Utc>) -> Self::Value;
    fn from_object(&self, handle: ObjectHandle) -> Self::Value;
    fn from_list(&self, handle: ListHandle) -> Self::Value;
    fn from_results(&self, handle: ResultsHandle) -> Self::Value;

    /// Element count of a list-shaped value
    fn list_size(&self, value: &Self::Value) -> AccessorResult<usize>;
    /// Element of a list-shaped value
    fn list_value_at_index(&self, value: &Self::Value, index: usize)
        -> AccessorResult<Self::Value>;

    /// Whether a keyed value exposes the key
    fn dict_has_value_for_key(&self, value: &Self::Value, key: &str) -> AccessorResult<bool>;
    /// The keyed value's entry, `None` when absent
    fn dict_value_for_key(
        &self,
        value: &Self::Value,
        key: &str,
    ) -> AccessorResult<Option<Self::Value>>;

    /// Whether a default is declared for a property
    fn has_default_value_for_property(
        &self,
        object_type: &str,
        property: &str,
    ) -> AccessorResult<bool>;
    /// The resolved default for a property, `None` when undeclared
    fn default_value_for_property(
        &self,
        object_type: &str,
        property: &str,
    ) -> AccessorResult<Option<Self::Value>>;

    /// Resolves a value to a row of the target type, inserting keyed
    /// containers as new objects; the entry point for link properties
    fn to_object_index(
        &self,
        txn: &mut WriteTxn<'_>,
        value: &Self::Value,
        object_type: &str,
        is_update: bool,
    ) -> AccessorResult<usize>;

    /// Resolves a value to an existing row of the target type without
    /// ever inserting
    fn to_existing_object_index(
        &self,
        value: &Self::Value,
        object_type: &str,
    ) -> AccessorResult<usize>;
}

/// Writes every property of a row from a source value, in schema order.
///
/// `updating` skips properties the source does not supply, keeping their
/// current columns. `is_update` is the graph-wide create-vs-update policy
/// handed down to nested link resolution.
pub(crate) fn write_properties<A: ValueAccessor>(
    txn: &mut WriteTxn<'_>,
    accessor: &A,
    schema: &ObjectSchema,
    row: usize,
    source: &A::Value,
    updating: bool,
    is_update: bool,
) -> AccessorResult<()> {
    for (index, prop) in schema.properties.iter().enumerate() {
        // Updates take only what the source supplies; declared defaults
        // apply to fresh rows, never over existing columns
        let resolved = if updating {
            accessor.dict_value_for_key(source, &prop.name)
        } else {
            accessor.value_for_property(source, &schema.name, prop, index)
        }
        .map_err(|e| e.with_property(&schema.name, &prop.name))?;

        let value = match resolved {
            Some(value) => value,
            None if updating => continue,
            None => match &prop.kind {
                // A list with no supplied value starts out empty
                PropertyKind::List { .. } => {
                    txn.set_column(&schema.name, row, index, Column::LinkList(Vec::new()))?;
                    continue;
                }
                _ if prop.optional => {
                    txn.set_column(&schema.name, row, index, Column::Null)?;
                    continue;
                }
                _ => {
                    return Err(
                        AccessorError::missing().with_property(&schema.name, &prop.name)
                    )
                }
            },
        };

        let column = convert_value(txn, accessor, prop, &value, is_update)
            .map_err(|e| e.with_property(&schema.name, &prop.name))?;
        txn.set_column(&schema.name, row, index, column)?;
    }
    Ok(())
}

/// Writes a single property of an existing row from a supplied value
pub(crate) fn write_single<A: ValueAccessor>(
    txn: &mut WriteTxn<'_>,
    accessor: &A,
    schema: &ObjectSchema,
    row: usize,
    index: usize,
    value: &A::Value,
) -> AccessorResult<()> {
    let prop = schema.property_at(index).ok_or_else(|| {
        AccessorError::Internal(format!(
            "property index {} out of range for '{}'",
            index, schema.name
        ))
    })?;
    let column = convert_value(txn, accessor, prop, value, false)
        .map_err(|e| e.with_property(&schema.name, &prop.name))?;
    txn.set_column(&schema.name, row, index, column)
}

/// Converts one supplied value to its typed column per the property kind
fn convert_value<A: ValueAccessor>(
    txn: &mut WriteTxn<'_>,
    accessor: &A,
    prop: &Property,
    value: &A::Value,
    is_update: bool,
) -> AccessorResult<Column> {
    if accessor.is_null(value) {
        return match &prop.kind {
            // Null clears a list
            PropertyKind::List { .. } => Ok(Column::LinkList(Vec::new())),
            _ if prop.optional => Ok(Column::Null),
            kind => Err(AccessorError::mismatch(kind.kind_name(), "null")),
        };
    }

    Ok(match &prop.kind {
        PropertyKind::Bool => Column::Bool(accessor.to_bool(value)?),
        PropertyKind::Int => Column::Int(accessor.to_long(value)?),
        PropertyKind::Float => Column::Float(accessor.to_float(value)?),
        PropertyKind::Double => Column::Double(accessor.to_double(value)?),
        PropertyKind::String => Column::String(accessor.to_string(value)?),
        PropertyKind::Data => Column::Data(accessor.to_binary(value)?),
        PropertyKind::Date => Column::Date(accessor.to_timestamp(value)?),
        PropertyKind::Any => accessor.to_mixed(value)?,
        PropertyKind::Object { target } => {
            Column::Link(accessor.to_object_index(txn, value, target, is_update)?)
        }
        PropertyKind::List { target } => {
            let len = accessor.list_size(value)?;
            let mut links = Vec::with_capacity(len);
            for i in 0..len {
                let element = accessor.list_value_at_index(value, i)?;
                links.push(accessor.to_object_index(txn, &element, target, is_update)?);
            }
            Column::LinkList(links)
        }
    })
}

/// Reads one property of a row back out as a dynamic value
pub(crate) fn property_value<A: ValueAccessor>(
    accessor: &A,
    store: &Store,
    type_name: &str,
    row: usize,
    index: usize,
) -> AccessorResult<A::Value> {
    let schema = store.schema(type_name)?;
    let prop = schema.property_at(index).ok_or_else(|| {
        AccessorError::Internal(format!(
            "property index {} out of range for '{}'",
            index, type_name
        ))
    })?;

    Ok(match store.column(type_name, row, index)? {
        Column::Null => accessor.null_value(),
        Column::Bool(v) => accessor.from_bool(v),
        Column::Int(v) => accessor.from_long(v),
        Column::Float(v) => accessor.from_float(v),
        Column::Double(v) => accessor.from_double(v),
        Column::String(v) => accessor.from_string(v),
        Column::Data(v) => accessor.from_binary(v),
        Column::Date(v) => accessor.from_timestamp(v),
        Column::Link(target_row) => {
            let target = prop.kind.link_target().ok_or_else(|| {
                AccessorError::Internal(format!(
                    "link column under non-link property '{}.{}'",
                    type_name, prop.name
                ))
            })?;
            accessor.from_object(store.get(target, target_row)?)
        }
        Column::LinkList(_) => {
            accessor.from_list(ListHandle::new(store.clone(), type_name, row, index))
        }
    })
}
