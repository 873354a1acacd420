//! Per-operation accessor context
//!
//! A context is bound to exactly one of:
//! - an existing object instance, for reading and writing its properties
//! - a target type plus a create-or-update flag, for inserting new object
//!   graphs
//!
//! It owns the per-context default cache (a generated-id default resolves
//! at most once per context) and the in-flight insertion stack used for
//! depth limiting and primary-key cycle detection. Contexts are built for
//! one write transaction and discarded with it.

use std::cell::RefCell;
use std::collections::HashMap;

use uuid::Uuid;

use crate::observability::{log_event, Event};
use crate::schema::{DefaultSpec, Property, PropertyKind};
use crate::store::{
    self, ObjectHandle, PkValue, Store, ValueAccessor, WriteTxn,
};
use crate::value::{Dynamic, Shape};

use super::errors::{AccessorError, AccessorResult};

/// What a context is bound to
#[derive(Debug, Clone)]
enum Binding {
    /// An existing object instance
    Instance(ObjectHandle),
    /// A target type for inserting new object graphs
    Insert { type_name: String, is_create: bool },
}

/// An object being written somewhere up the insertion stack
struct InFlight {
    type_name: String,
    key: Option<PkValue>,
    row: usize,
}

/// Per-operation context between dynamic values and the store
pub struct AccessorContext<'s> {
    store: &'s Store,
    binding: Binding,
    /// (type, property) → resolved default; populated lazily, including
    /// negative results, and never shared across contexts
    defaults: RefCell<HashMap<(String, String), Option<Dynamic>>>,
    in_flight: RefCell<Vec<InFlight>>,
}

impl<'s> AccessorContext<'s> {
    /// Binds a context to an existing object instance
    pub fn for_object(store: &'s Store, instance: ObjectHandle) -> AccessorResult<Self> {
        if !instance.store().same_store(store) {
            return Err(AccessorError::Internal(
                "instance belongs to a different store".into(),
            ));
        }
        Ok(Self {
            store,
            binding: Binding::Instance(instance),
            defaults: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(Vec::new()),
        })
    }

    /// Binds a context to a target type for object-graph insertion.
    ///
    /// With `is_create` false, insertions update the existing object that
    /// shares the supplied primary key instead of failing on collision.
    pub fn for_insert(store: &'s Store, type_name: &str, is_create: bool) -> AccessorResult<Self> {
        store.schema(type_name)?;
        Ok(Self {
            store,
            binding: Binding::Insert {
                type_name: type_name.to_string(),
                is_create,
            },
            defaults: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(Vec::new()),
        })
    }

    /// The store this context operates on
    pub fn store(&self) -> &Store {
        self.store
    }

    /// The bound object type
    pub fn type_name(&self) -> &str {
        match &self.binding {
            Binding::Instance(instance) => instance.type_name(),
            Binding::Insert { type_name, .. } => type_name,
        }
    }

    /// The bound instance, for instance-bound contexts
    pub fn instance(&self) -> Option<&ObjectHandle> {
        match &self.binding {
            Binding::Instance(instance) => Some(instance),
            Binding::Insert { .. } => None,
        }
    }

    /// The schema-declared default for a property of the bound type.
    ///
    /// Idempotent per context: repeated calls return the same value
    /// without recomputation, so a generated id is stable for the whole
    /// insertion.
    pub fn default_value(&self, property: &str) -> AccessorResult<Option<Dynamic>> {
        self.default_for(self.type_name(), property)
    }

    pub(super) fn default_for(
        &self,
        type_name: &str,
        property: &str,
    ) -> AccessorResult<Option<Dynamic>> {
        let cache_key = (type_name.to_string(), property.to_string());
        if let Some(cached) = self.defaults.borrow().get(&cache_key) {
            return Ok(cached.clone());
        }

        let schema = self.store.schema(type_name)?;
        let resolved = schema
            .property(property)
            .and_then(|(_, prop)| prop.default.as_ref())
            .map(|spec| match spec {
                DefaultSpec::Value(value) => Dynamic::from_json(value.clone()),
                DefaultSpec::GeneratedId => Dynamic::Str(Uuid::new_v4().to_string()),
            });

        self.defaults.borrow_mut().insert(cache_key, resolved.clone());
        Ok(resolved)
    }

    /// Extracts the value to use for the bound type's property at an
    /// index from a dynamic source.
    ///
    /// Resolution order: the source's own entry for the property's key,
    /// else the declared default, else `None` — the store decides whether
    /// "no value" is fatal.
    pub fn value(&self, source: &Dynamic, index: usize) -> AccessorResult<Option<Dynamic>> {
        let schema = self.store.schema(self.type_name())?;
        let prop = schema.property_at(index).ok_or_else(|| {
            AccessorError::Internal(format!(
                "property index {} out of range for '{}'",
                index,
                self.type_name()
            ))
        })?;
        self.value_for_property(source, &schema.name, prop, index)
    }

    /// Wraps a persisted-object handle into the dynamic representation
    pub fn wrap_object(&self, handle: ObjectHandle) -> Dynamic {
        Dynamic::Object(handle)
    }

    /// Wraps a live list handle into the dynamic representation
    pub fn wrap_list(&self, handle: store::ListHandle) -> Dynamic {
        Dynamic::List(handle)
    }

    /// Wraps a live results handle into the dynamic representation
    pub fn wrap_results(&self, handle: store::ResultsHandle) -> Dynamic {
        Dynamic::Results(handle)
    }

    /// Inserts the bound type from a dynamic value, honoring the
    /// context's create-or-update flag
    pub fn insert(&self, txn: &mut WriteTxn<'_>, value: &Dynamic) -> AccessorResult<usize> {
        match &self.binding {
            Binding::Insert {
                type_name,
                is_create,
            } => {
                let type_name = type_name.clone();
                let is_update = !*is_create;
                self.add_object(txn, value, &type_name, is_update)
            }
            Binding::Instance(_) => Err(AccessorError::Internal(
                "insert on an instance-bound context".into(),
            )),
        }
    }

    /// Inserts a dynamic value as an object of the named type, returning
    /// its row index.
    ///
    /// Keyed containers insert recursively, depth-first; an
    /// already-wrapped object of the type passes through by identity.
    /// With `is_update` true and a primary-key schema, a matching
    /// existing object is updated in place and properties the value does
    /// not supply keep their current columns.
    pub fn add_object(
        &self,
        txn: &mut WriteTxn<'_>,
        value: &Dynamic,
        type_name: &str,
        is_update: bool,
    ) -> AccessorResult<usize> {
        if let Dynamic::Object(handle) = value {
            return self.reuse_handle(handle, type_name);
        }
        if value.shape() != Shape::Keyed {
            return Err(AccessorError::mismatch(
                format!("a keyed container for '{}'", type_name),
                value.type_name(),
            ));
        }

        let limit = self.store.config().max_nesting_depth;
        if self.in_flight.borrow().len() >= limit {
            return Err(AccessorError::DepthExceeded { limit });
        }

        let schema = self.store.schema(type_name)?;

        // Resolve the primary key before touching any row: a nested value
        // that names an object already mid-insertion must resolve to that
        // object's row rather than recursing into it again.
        let mut pk = None;
        if let Some((pk_index, pk_prop)) = schema.primary_key_property() {
            let supplied = self
                .value_for_property(value, &schema.name, pk_prop, pk_index)
                .map_err(|e| e.with_property(&schema.name, &pk_prop.name))?
                .ok_or_else(|| {
                    AccessorError::missing().with_property(&schema.name, &pk_prop.name)
                })?;
            let key = self
                .pk_from_dynamic(&supplied, pk_prop)
                .map_err(|e| e.with_property(&schema.name, &pk_prop.name))?;
            if let Some(existing) = self.find_in_flight(type_name, &key) {
                return Ok(existing);
            }
            pk = Some(key);
        }

        let (row, updating) = match &pk {
            Some(key) => match self.store.find_by_primary_key(type_name, key)? {
                Some(existing) if is_update => {
                    txn.snapshot_for_update(type_name, existing)?;
                    (existing, true)
                }
                Some(_) => {
                    return Err(AccessorError::DuplicateKey {
                        object_type: type_name.to_string(),
                        key: key.to_string(),
                    })
                }
                None => (txn.allocate(type_name, pk.clone())?, false),
            },
            None => (txn.allocate(type_name, None)?, false),
        };

        self.in_flight.borrow_mut().push(InFlight {
            type_name: type_name.to_string(),
            key: pk,
            row,
        });
        let written = store::write_properties(txn, self, &schema, row, value, updating, is_update);
        self.in_flight.borrow_mut().pop();
        written?;

        let event = if updating {
            Event::ObjectUpdated
        } else {
            Event::ObjectCreated
        };
        log_event(event, &[("type", type_name), ("row", &row.to_string())]);
        Ok(row)
    }

    /// Reads one property of the bound instance
    pub fn get(&self, property: &str) -> AccessorResult<Dynamic> {
        let instance = self.require_instance()?;
        let schema = self.store.schema(instance.type_name())?;
        let (index, _) = schema.property(property).ok_or_else(|| {
            AccessorError::UnknownProperty {
                object_type: instance.type_name().to_string(),
                property: property.to_string(),
            }
        })?;
        store::property_value(self, self.store, instance.type_name(), instance.row(), index)
    }

    /// Writes one property of the bound instance from a dynamic value
    pub fn set(
        &self,
        txn: &mut WriteTxn<'_>,
        property: &str,
        value: &Dynamic,
    ) -> AccessorResult<()> {
        let instance = self.require_instance()?;
        let schema = self.store.schema(instance.type_name())?;
        let (index, _) = schema.property(property).ok_or_else(|| {
            AccessorError::UnknownProperty {
                object_type: instance.type_name().to_string(),
                property: property.to_string(),
            }
        })?;
        txn.snapshot_for_update(instance.type_name(), instance.row())?;
        store::write_single(txn, self, &schema, instance.row(), index, value)
    }

    fn require_instance(&self) -> AccessorResult<&ObjectHandle> {
        self.instance().ok_or_else(|| {
            AccessorError::Internal("operation requires an instance-bound context".into())
        })
    }

    /// Resolves an already-wrapped object for reuse under a link property
    pub(super) fn reuse_handle(
        &self,
        handle: &ObjectHandle,
        type_name: &str,
    ) -> AccessorResult<usize> {
        if handle.type_name() != type_name {
            return Err(AccessorError::mismatch(
                format!("'{}' object", type_name),
                format!("'{}' object", handle.type_name()),
            ));
        }
        if !handle.store().same_store(self.store) {
            return Err(AccessorError::mismatch(
                format!("'{}' object from this store", type_name),
                "object from another store",
            ));
        }
        if !handle.is_live() {
            return Err(AccessorError::DeadObject {
                object_type: type_name.to_string(),
                row: handle.row(),
            });
        }
        Ok(handle.row())
    }

    /// Coerces a supplied value to a primary-key value per the key
    /// property's kind
    pub(super) fn pk_from_dynamic(
        &self,
        value: &Dynamic,
        pk_prop: &Property,
    ) -> AccessorResult<PkValue> {
        match pk_prop.kind {
            PropertyKind::Int => Ok(PkValue::Int(self.to_long(value)?)),
            PropertyKind::String => Ok(PkValue::Str(self.to_string(value)?)),
            _ => Err(AccessorError::Internal(format!(
                "primary key property '{}' has unkeyable kind",
                pk_prop.name
            ))),
        }
    }

    fn find_in_flight(&self, type_name: &str, key: &PkValue) -> Option<usize> {
        self.in_flight
            .borrow()
            .iter()
            .find(|entry| {
                entry.type_name == type_name && entry.key.as_ref() == Some(key)
            })
            .map(|entry| entry.row)
    }
}
