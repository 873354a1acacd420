//! heliodb - A schema-driven, embedded object store with a dynamic accessor layer

pub mod accessor;
pub mod cli;
pub mod config;
pub mod observability;
pub mod schema;
pub mod store;
pub mod value;
