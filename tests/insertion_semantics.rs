//! Object-Graph Insertion Tests
//!
//! Tests for the accessor's insertion contract:
//! - value() resolution order: supplied, then default, then "no value"
//! - per-context default caching, including generated identifiers
//! - create-vs-update semantics keyed by primary key
//! - depth-first nested insertion in schema property order
//! - cycle handling and the nesting depth limit
//! - rollback leaves no partial rows behind

use heliodb::accessor::{AccessorContext, AccessorError};
use heliodb::config::StoreConfig;
use heliodb::schema::{DefaultSpec, ObjectSchema, Property, PropertyKind, SchemaRegistry};
use heliodb::store::{Store, ValueAccessor};
use heliodb::value::Dynamic;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn base_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            ObjectSchema::new(
                "person",
                vec![
                    Property::new("id", PropertyKind::Int),
                    Property::new("name", PropertyKind::String),
                    Property::new("age", PropertyKind::Int)
                        .optional()
                        .with_default(DefaultSpec::Value(json!(7))),
                    Property::new("dog", PropertyKind::Object {
                        target: "dog".into(),
                    })
                    .optional(),
                    Property::new("dogs", PropertyKind::List {
                        target: "dog".into(),
                    }),
                ],
            )
            .with_primary_key("id"),
        )
        .unwrap();
    registry
        .register(ObjectSchema::new(
            "dog",
            vec![
                Property::new("name", PropertyKind::String),
                Property::new("weight", PropertyKind::Double).optional(),
            ],
        ))
        .unwrap();
    registry
}

fn open_store() -> Store {
    Store::open(base_registry(), StoreConfig::default()).unwrap()
}

fn dyn_doc(value: serde_json::Value) -> Dynamic {
    Dynamic::from_json(value)
}

// =============================================================================
// Value Resolution Order
// =============================================================================

/// A supplied value beats a declared default.
#[test]
fn test_supplied_value_beats_default() {
    let store = open_store();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let schema = store.schema("person").unwrap();
    let (age_index, _) = schema.property("age").unwrap();

    let source = dyn_doc(json!({"id": 1, "name": "ada", "age": 5}));
    assert_eq!(
        ctx.value(&source, age_index).unwrap(),
        Some(Dynamic::Int(5))
    );
}

/// The declared default fills an absent key.
#[test]
fn test_default_fills_absent_key() {
    let store = open_store();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let schema = store.schema("person").unwrap();
    let (age_index, _) = schema.property("age").unwrap();

    let source = dyn_doc(json!({"id": 1, "name": "ada"}));
    assert_eq!(
        ctx.value(&source, age_index).unwrap(),
        Some(Dynamic::Int(7))
    );
}

/// With neither a supplied value nor a default, resolution reports
/// "no value" and lets the store decide.
#[test]
fn test_no_value_without_supply_or_default() {
    let store = open_store();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let schema = store.schema("person").unwrap();
    let (name_index, _) = schema.property("name").unwrap();

    let source = dyn_doc(json!({"id": 1}));
    assert_eq!(ctx.value(&source, name_index).unwrap(), None);
}

/// A missing required property is fatal on create.
#[test]
fn test_missing_required_is_fatal_on_create() {
    let store = open_store();
    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();

    let err = ctx
        .insert(&mut txn, &dyn_doc(json!({"id": 1})))
        .unwrap_err();
    assert_eq!(
        err,
        AccessorError::MissingValue {
            property: "person.name".into()
        }
    );
}

// =============================================================================
// Default Cache
// =============================================================================

/// Defaults resolve identically on repeated lookup within one context.
#[test]
fn test_default_lookup_is_idempotent() {
    let store = open_store();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();

    let first = ctx.default_value("age").unwrap();
    let second = ctx.default_value("age").unwrap();
    assert_eq!(first, Some(Dynamic::Int(7)));
    assert_eq!(first, second);

    // Undeclared defaults cache their absence too
    assert_eq!(ctx.default_value("name").unwrap(), None);
    assert_eq!(ctx.default_value("name").unwrap(), None);
}

/// A generated-id default is stable within a context and fresh across
/// contexts.
#[test]
fn test_generated_id_scope() {
    let mut registry = base_registry();
    registry
        .register(
            ObjectSchema::new(
                "event",
                vec![
                    Property::new("id", PropertyKind::String)
                        .with_default(DefaultSpec::GeneratedId),
                    Property::new("title", PropertyKind::String),
                ],
            )
            .with_primary_key("id"),
        )
        .unwrap();
    let store = Store::open(registry, StoreConfig::default()).unwrap();

    let ctx = AccessorContext::for_insert(&store, "event", true).unwrap();
    let first = ctx.default_value("id").unwrap().unwrap();
    let second = ctx.default_value("id").unwrap().unwrap();
    assert_eq!(first, second);

    let other = AccessorContext::for_insert(&store, "event", true).unwrap();
    assert_ne!(other.default_value("id").unwrap().unwrap(), first);
}

/// An object inserted without a key gets the context's generated id.
#[test]
fn test_generated_id_fills_primary_key() {
    let mut registry = base_registry();
    registry
        .register(
            ObjectSchema::new(
                "event",
                vec![
                    Property::new("id", PropertyKind::String)
                        .with_default(DefaultSpec::GeneratedId),
                    Property::new("title", PropertyKind::String),
                ],
            )
            .with_primary_key("id"),
        )
        .unwrap();
    let store = Store::open(registry, StoreConfig::default()).unwrap();

    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "event", true).unwrap();
    let row = ctx
        .insert(&mut txn, &dyn_doc(json!({"title": "launch"})))
        .unwrap();
    txn.commit();

    let stored = store.get("event", row).unwrap().get("id").unwrap();
    assert_eq!(Some(stored), ctx.default_value("id").unwrap());
}

// =============================================================================
// Create vs Update
// =============================================================================

/// With update semantics, a matching key mutates in place and unsupplied
/// properties keep their values.
#[test]
fn test_update_in_place_by_primary_key() {
    let store = open_store();
    let mut txn = store.begin_write();

    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let row = ctx
        .insert(
            &mut txn,
            &dyn_doc(json!({"id": 1, "name": "ada", "age": 30})),
        )
        .unwrap();

    let ctx = AccessorContext::for_insert(&store, "person", false).unwrap();
    let updated = ctx
        .insert(&mut txn, &dyn_doc(json!({"id": 1, "age": 31})))
        .unwrap();
    txn.commit();

    assert_eq!(updated, row);
    assert_eq!(store.live_count("person").unwrap(), 1);
    let person = store.get("person", row).unwrap();
    assert_eq!(person.get("name").unwrap(), Dynamic::Str("ada".into()));
    assert_eq!(person.get("age").unwrap(), Dynamic::Int(31));
}

/// Declared defaults fill fresh rows only; an update never re-applies
/// them over existing columns.
#[test]
fn test_update_does_not_reapply_defaults() {
    let store = open_store();
    let mut txn = store.begin_write();

    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let row = ctx
        .insert(
            &mut txn,
            &dyn_doc(json!({"id": 1, "name": "ada", "age": 30})),
        )
        .unwrap();

    let ctx = AccessorContext::for_insert(&store, "person", false).unwrap();
    ctx.insert(&mut txn, &dyn_doc(json!({"id": 1, "name": "lovelace"})))
        .unwrap();
    txn.commit();

    let person = store.get("person", row).unwrap();
    assert_eq!(person.get("name").unwrap(), Dynamic::Str("lovelace".into()));
    // age keeps 30; the declared default of 7 applies to creation only
    assert_eq!(person.get("age").unwrap(), Dynamic::Int(30));
}

/// Without update semantics, a colliding key fails instead of mutating.
#[test]
fn test_create_with_colliding_key_fails() {
    let store = open_store();
    let mut txn = store.begin_write();

    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    ctx.insert(&mut txn, &dyn_doc(json!({"id": 1, "name": "ada"})))
        .unwrap();

    let err = ctx
        .insert(&mut txn, &dyn_doc(json!({"id": 1, "name": "bob"})))
        .unwrap_err();
    assert!(matches!(err, AccessorError::DuplicateKey { .. }));

    txn.commit();
    let person = store.get("person", 0).unwrap();
    assert_eq!(person.get("name").unwrap(), Dynamic::Str("ada".into()));
}

// =============================================================================
// Nested Insertion
// =============================================================================

/// Every dictionary element under a list property becomes its own
/// recursive insertion, in order.
#[test]
fn test_nested_list_insertion() {
    let store = open_store();
    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();

    let row = ctx
        .insert(
            &mut txn,
            &dyn_doc(json!({
                "id": 1,
                "name": "ada",
                "dogs": [
                    {"name": "rex", "weight": 30.5},
                    {"name": "fido"},
                    {"name": "brutus"}
                ]
            })),
        )
        .unwrap();
    txn.commit();

    assert_eq!(store.live_count("dog").unwrap(), 3);

    let person = store.get("person", row).unwrap();
    let Dynamic::List(dogs) = person.get("dogs").unwrap() else {
        panic!("expected a wrapped list");
    };
    assert_eq!(dogs.len().unwrap(), 3);
    assert_eq!(
        dogs.get(1).unwrap().get("name").unwrap(),
        Dynamic::Str("fido".into())
    );
    assert_eq!(
        dogs.get(0).unwrap().get("weight").unwrap(),
        Dynamic::Float(30.5)
    );
}

/// A nested dictionary under an object property inserts depth-first and
/// links by row.
#[test]
fn test_nested_object_insertion() {
    let store = open_store();
    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();

    let row = ctx
        .insert(
            &mut txn,
            &dyn_doc(json!({
                "id": 1,
                "name": "ada",
                "dog": {"name": "rex"}
            })),
        )
        .unwrap();
    txn.commit();

    let person = store.get("person", row).unwrap();
    let Dynamic::Object(dog) = person.get("dog").unwrap() else {
        panic!("expected a wrapped object");
    };
    assert_eq!(dog.get("name").unwrap(), Dynamic::Str("rex".into()));
}

/// An already-wrapped object is reused by identity, not copied.
#[test]
fn test_wrapped_object_reuse() {
    let store = open_store();
    let mut txn = store.begin_write();

    let ctx = AccessorContext::for_insert(&store, "dog", true).unwrap();
    let dog_row = ctx
        .add_object(&mut txn, &dyn_doc(json!({"name": "rex"})), "dog", false)
        .unwrap();
    let dog = store.get("dog", dog_row).unwrap();

    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let reused = ctx
        .to_object_index(&mut txn, &Dynamic::Object(dog), "dog", false)
        .unwrap();
    txn.commit();

    assert_eq!(reused, dog_row);
    assert_eq!(store.live_count("dog").unwrap(), 1);
}

/// A wrapped object of the wrong type is a type mismatch.
#[test]
fn test_wrapped_object_type_checked() {
    let store = open_store();
    let mut txn = store.begin_write();

    let ctx = AccessorContext::for_insert(&store, "dog", true).unwrap();
    let dog_row = ctx
        .add_object(&mut txn, &dyn_doc(json!({"name": "rex"})), "dog", false)
        .unwrap();
    let dog = store.get("dog", dog_row).unwrap();

    let err = ctx
        .to_object_index(&mut txn, &Dynamic::Object(dog), "person", false)
        .unwrap_err();
    assert!(matches!(err, AccessorError::TypeMismatch { .. }));
}

// =============================================================================
// Identity Resolution
// =============================================================================

/// to_existing_object_index resolves by key and never inserts.
#[test]
fn test_existing_object_index_by_key() {
    let store = open_store();
    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let row = ctx
        .insert(&mut txn, &dyn_doc(json!({"id": 9, "name": "ada"})))
        .unwrap();
    txn.commit();

    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    assert_eq!(
        ctx.to_existing_object_index(&Dynamic::Int(9), "person").unwrap(),
        row
    );
    // A keyed container carrying the key property works too
    assert_eq!(
        ctx.to_existing_object_index(&dyn_doc(json!({"id": 9})), "person")
            .unwrap(),
        row
    );

    let err = ctx
        .to_existing_object_index(&Dynamic::Int(404), "person")
        .unwrap_err();
    assert!(matches!(err, AccessorError::IdentityNotFound { .. }));
    assert_eq!(store.live_count("person").unwrap(), 1);
}

/// Without a primary key, only an already-wrapped object resolves.
#[test]
fn test_existing_object_index_without_primary_key() {
    let store = open_store();
    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "dog", true).unwrap();
    let row = ctx
        .add_object(&mut txn, &dyn_doc(json!({"name": "rex"})), "dog", false)
        .unwrap();
    txn.commit();

    let dog = store.get("dog", row).unwrap();
    let ctx = AccessorContext::for_insert(&store, "dog", true).unwrap();
    assert_eq!(
        ctx.to_existing_object_index(&Dynamic::Object(dog), "dog").unwrap(),
        row
    );
    assert!(matches!(
        ctx.to_existing_object_index(&Dynamic::Int(0), "dog").unwrap_err(),
        AccessorError::IdentityNotFound { .. }
    ));
}

// =============================================================================
// Unsupported Kind
// =============================================================================

/// Writing a declared any property fails fast with unsupported-type,
/// tagged with the property.
#[test]
fn test_any_property_write_is_unsupported() {
    let mut registry = base_registry();
    registry
        .register(ObjectSchema::new(
            "thing",
            vec![
                Property::new("label", PropertyKind::String),
                Property::new("meta", PropertyKind::Any).optional(),
            ],
        ))
        .unwrap();
    let store = Store::open(registry, StoreConfig::default()).unwrap();

    {
        let mut txn = store.begin_write();
        let ctx = AccessorContext::for_insert(&store, "thing", true).unwrap();
        let err = ctx
            .insert(&mut txn, &dyn_doc(json!({"label": "x", "meta": 1})))
            .unwrap_err();
        assert_eq!(
            err,
            AccessorError::UnsupportedType {
                property: "thing.meta".into()
            }
        );
        txn.rollback();
    }

    // Leaving the any property unsupplied is fine; it stays null
    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "thing", true).unwrap();
    let row = ctx
        .insert(&mut txn, &dyn_doc(json!({"label": "y"})))
        .unwrap();
    txn.commit();
    assert_eq!(
        store.get("thing", row).unwrap().get("meta").unwrap(),
        Dynamic::Null
    );
}

// =============================================================================
// Cycles and Depth
// =============================================================================

/// Mutually-referencing keyed objects insert without looping.
#[test]
fn test_primary_key_cycle_terminates() {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            ObjectSchema::new(
                "person",
                vec![
                    Property::new("id", PropertyKind::Int),
                    Property::new("friend", PropertyKind::Object {
                        target: "person".into(),
                    })
                    .optional(),
                ],
            )
            .with_primary_key("id"),
        )
        .unwrap();
    let store = Store::open(registry, StoreConfig::default()).unwrap();

    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let row = ctx
        .insert(
            &mut txn,
            &dyn_doc(json!({
                "id": 1,
                "friend": {"id": 2, "friend": {"id": 1}}
            })),
        )
        .unwrap();
    txn.commit();

    assert_eq!(store.live_count("person").unwrap(), 2);
    let first = store.get("person", row).unwrap();
    let Dynamic::Object(second) = first.get("friend").unwrap() else {
        panic!("expected a wrapped object");
    };
    let Dynamic::Object(back) = second.get("friend").unwrap() else {
        panic!("expected a wrapped object");
    };
    assert_eq!(back, first);
}

/// A self-reference resolves to the object being inserted.
#[test]
fn test_self_reference_resolves_in_flight() {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            ObjectSchema::new(
                "person",
                vec![
                    Property::new("id", PropertyKind::Int),
                    Property::new("friend", PropertyKind::Object {
                        target: "person".into(),
                    })
                    .optional(),
                ],
            )
            .with_primary_key("id"),
        )
        .unwrap();
    let store = Store::open(registry, StoreConfig::default()).unwrap();

    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
    let row = ctx
        .insert(&mut txn, &dyn_doc(json!({"id": 1, "friend": {"id": 1}})))
        .unwrap();
    txn.commit();

    assert_eq!(store.live_count("person").unwrap(), 1);
    let person = store.get("person", row).unwrap();
    let Dynamic::Object(friend) = person.get("friend").unwrap() else {
        panic!("expected a wrapped object");
    };
    assert_eq!(friend, person);
}

/// Keyless chains are cut by the configured nesting limit.
#[test]
fn test_depth_limit_on_keyless_chain() {
    let mut registry = SchemaRegistry::new();
    registry
        .register(ObjectSchema::new(
            "node",
            vec![
                Property::new("label", PropertyKind::String).optional(),
                Property::new("child", PropertyKind::Object {
                    target: "node".into(),
                })
                .optional(),
            ],
        ))
        .unwrap();
    let config = StoreConfig {
        max_nesting_depth: 4,
        ..StoreConfig::default()
    };
    let store = Store::open(registry, config).unwrap();

    let mut doc = json!({"label": "leaf"});
    for _ in 0..10 {
        doc = json!({"child": doc});
    }

    let mut txn = store.begin_write();
    let ctx = AccessorContext::for_insert(&store, "node", true).unwrap();
    let err = ctx.insert(&mut txn, &dyn_doc(doc)).unwrap_err();
    assert_eq!(err, AccessorError::DepthExceeded { limit: 4 });
}

// =============================================================================
// Atomicity
// =============================================================================

/// A failure partway through a graph insertion rolls back every row the
/// transaction created, including completed nested objects.
#[test]
fn test_rollback_discards_partial_graph() {
    let store = open_store();
    let txn_result = {
        let mut txn = store.begin_write();
        let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
        let result = ctx.insert(
            &mut txn,
            &dyn_doc(json!({
                "id": 1,
                "name": "ada",
                "dogs": [
                    {"name": "rex"},
                    {"name": "fido"},
                    {"name": 5}
                ]
            })),
        );
        match result {
            Err(err) => {
                txn.rollback();
                err
            }
            Ok(_) => panic!("insertion should fail on the third dog"),
        }
    };

    assert_eq!(
        txn_result,
        AccessorError::TypeMismatch {
            property: "dog.name".into(),
            expected: "string".into(),
            actual: "int".into(),
        }
    );
    assert_eq!(store.live_count("person").unwrap(), 0);
    assert_eq!(store.live_count("dog").unwrap(), 0);
}

/// Dropping an uncommitted transaction rolls back implicitly.
#[test]
fn test_implicit_rollback_on_drop() {
    let store = open_store();
    {
        let mut txn = store.begin_write();
        let ctx = AccessorContext::for_insert(&store, "person", true).unwrap();
        ctx.insert(&mut txn, &dyn_doc(json!({"id": 1, "name": "ada"})))
            .unwrap();
        // txn dropped without commit
    }
    assert_eq!(store.live_count("person").unwrap(), 0);
}
