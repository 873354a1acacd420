//! Live storage handles
//!
//! Handles are views, not copies: every read goes through the store, so a
//! mutation between wrapping and reading is visible through an existing
//! handle. Equality is identity — same store, same row — never value
//! comparison.

use serde_json::{json, Value};

use crate::accessor::{AccessorContext, AccessorError, AccessorResult};
use crate::value::Dynamic;

use super::column::{Column, PkValue};
use super::engine::Store;
use super::materialize;

/// A live view over one persisted object
#[derive(Debug, Clone)]
pub struct ObjectHandle {
    store: Store,
    type_name: String,
    row: usize,
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.store.same_store(&other.store)
            && self.type_name == other.type_name
            && self.row == other.row
    }
}

impl ObjectHandle {
    pub(crate) fn new(store: Store, type_name: &str, row: usize) -> Self {
        Self {
            store,
            type_name: type_name.to_string(),
            row,
        }
    }

    /// The object's type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The object's row index
    pub fn row(&self) -> usize {
        self.row
    }

    /// The store this handle reads through
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether the row is still live
    pub fn is_live(&self) -> bool {
        self.store.is_live(&self.type_name, self.row).unwrap_or(false)
    }

    /// The object's primary-key value, if its schema declares one
    pub fn pk_value(&self) -> AccessorResult<Option<PkValue>> {
        let schema = self.store.schema(&self.type_name)?;
        let Some((index, _)) = schema.primary_key_property() else {
            return Ok(None);
        };
        match self.store.column(&self.type_name, self.row, index)? {
            Column::Int(v) => Ok(Some(PkValue::Int(v))),
            Column::String(s) => Ok(Some(PkValue::Str(s))),
            _ => Ok(None),
        }
    }

    /// Reads one property by name
    pub fn get(&self, property: &str) -> AccessorResult<Dynamic> {
        let schema = self.store.schema(&self.type_name)?;
        let (index, _) = schema
            .property(property)
            .ok_or_else(|| AccessorError::UnknownProperty {
                object_type: self.type_name.clone(),
                property: property.to_string(),
            })?;
        let ctx = AccessorContext::for_object(&self.store, self.clone())?;
        materialize::property_value(&ctx, &self.store, &self.type_name, self.row, index)
    }

    /// Renders the full object as a JSON document.
    ///
    /// Linked objects render as references, so cyclic graphs terminate.
    pub fn snapshot_json(&self) -> AccessorResult<Value> {
        let schema = self.store.schema(&self.type_name)?;
        let ctx = AccessorContext::for_object(&self.store, self.clone())?;
        let mut doc = serde_json::Map::new();
        for (index, prop) in schema.properties.iter().enumerate() {
            let value =
                materialize::property_value(&ctx, &self.store, &self.type_name, self.row, index)?;
            doc.insert(prop.name.clone(), value.to_json());
        }
        Ok(Value::Object(doc))
    }

    /// A terminating JSON reference to this object: its key when the
    /// schema has one, its row otherwise
    pub fn reference_json(&self) -> Value {
        match self.pk_value() {
            Ok(Some(key)) => json!({"type": self.type_name, "key": key.to_json()}),
            _ => json!({"type": self.type_name, "row": self.row}),
        }
    }
}

/// A live view over one list property of one object
#[derive(Debug, Clone)]
pub struct ListHandle {
    store: Store,
    type_name: String,
    row: usize,
    index: usize,
}

impl PartialEq for ListHandle {
    fn eq(&self, other: &Self) -> bool {
        self.store.same_store(&other.store)
            && self.type_name == other.type_name
            && self.row == other.row
            && self.index == other.index
    }
}

impl ListHandle {
    pub(crate) fn new(store: Store, type_name: &str, row: usize, index: usize) -> Self {
        Self {
            store,
            type_name: type_name.to_string(),
            row,
            index,
        }
    }

    /// The list's element type
    pub fn target_type(&self) -> AccessorResult<String> {
        let schema = self.store.schema(&self.type_name)?;
        schema
            .property_at(self.index)
            .and_then(|prop| prop.kind.link_target())
            .map(str::to_string)
            .ok_or_else(|| {
                AccessorError::Internal(format!(
                    "'{}' property {} is not a list",
                    self.type_name, self.index
                ))
            })
    }

    fn links(&self) -> AccessorResult<Vec<usize>> {
        match self.store.column(&self.type_name, self.row, self.index)? {
            Column::LinkList(links) => Ok(links),
            other => Err(AccessorError::Internal(format!(
                "expected linklist column, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Live element count
    pub fn len(&self) -> AccessorResult<usize> {
        Ok(self.links()?.len())
    }

    /// Whether the list is currently empty
    pub fn is_empty(&self) -> AccessorResult<bool> {
        Ok(self.links()?.is_empty())
    }

    /// Handle to the element at an index
    pub fn get(&self, index: usize) -> AccessorResult<ObjectHandle> {
        let links = self.links()?;
        let row = *links
            .get(index)
            .ok_or(AccessorError::IndexOutOfBounds {
                index,
                len: links.len(),
            })?;
        let target = self.target_type()?;
        self.store.get(&target, row)
    }

    /// A JSON array of element references
    pub fn reference_json(&self) -> Value {
        let Ok(len) = self.len() else {
            return Value::Null;
        };
        let refs = (0..len)
            .map(|i| {
                self.get(i)
                    .map(|h| h.reference_json())
                    .unwrap_or(Value::Null)
            })
            .collect();
        Value::Array(refs)
    }
}

/// A live view over every object of one type
#[derive(Debug, Clone)]
pub struct ResultsHandle {
    store: Store,
    type_name: String,
}

impl PartialEq for ResultsHandle {
    fn eq(&self, other: &Self) -> bool {
        self.store.same_store(&other.store) && self.type_name == other.type_name
    }
}

impl ResultsHandle {
    pub(crate) fn new(store: Store, type_name: &str) -> Self {
        Self {
            store,
            type_name: type_name.to_string(),
        }
    }

    /// The result's object type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Live object count
    pub fn len(&self) -> AccessorResult<usize> {
        self.store.live_count(&self.type_name)
    }

    /// Whether there are currently no objects of the type
    pub fn is_empty(&self) -> AccessorResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Handle to the object at a position, in allocation order
    pub fn get(&self, index: usize) -> AccessorResult<ObjectHandle> {
        let rows = self.store.live_rows(&self.type_name)?;
        let row = *rows.get(index).ok_or(AccessorError::IndexOutOfBounds {
            index,
            len: rows.len(),
        })?;
        self.store.get(&self.type_name, row)
    }

    /// Handles to every live object, in allocation order
    pub fn handles(&self) -> AccessorResult<Vec<ObjectHandle>> {
        Ok(self
            .store
            .live_rows(&self.type_name)?
            .into_iter()
            .map(|row| ObjectHandle::new(self.store.clone(), &self.type_name, row))
            .collect())
    }

    /// A JSON array of object references
    pub fn reference_json(&self) -> Value {
        match self.handles() {
            Ok(handles) => {
                Value::Array(handles.iter().map(ObjectHandle::reference_json).collect())
            }
            Err(_) => Value::Null,
        }
    }
}
