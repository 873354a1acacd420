//! Lifecycle events
//!
//! A closed set of event names so log consumers can rely on stable keys.

/// Lifecycle event emitted by the store and registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A schema was registered
    SchemaRegistered,
    /// A store was opened over a registry
    StoreOpened,
    /// An object row was created
    ObjectCreated,
    /// An existing object row was updated in place
    ObjectUpdated,
    /// A write transaction committed
    TransactionCommit,
    /// A write transaction rolled back
    TransactionRollback,
}

impl Event {
    /// Returns the event name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaRegistered => "schema.registered",
            Event::StoreOpened => "store.opened",
            Event::ObjectCreated => "object.created",
            Event::ObjectUpdated => "object.updated",
            Event::TransactionCommit => "txn.commit",
            Event::TransactionRollback => "txn.rollback",
        }
    }
}
