//! Accessor error types
//!
//! Conversion failures carry the identity of the offending property
//! explicitly. Coercion helpers construct errors with a placeholder
//! subject; the property write that triggered the conversion tags them
//! with `type.property` before propagating, so a failure deep in a nested
//! graph still names the column it was meant for.

use thiserror::Error;

use crate::schema::SchemaError;

/// Placeholder subject used until an error is tagged with a property
pub(crate) const UNTAGGED: &str = "value";

/// Accessor and conversion errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessorError {
    /// The any/mixed storage kind is never writable
    #[error("{property}: the 'any' storage kind is unsupported")]
    UnsupportedType {
        /// Offending property as `type.name`
        property: String,
    },

    /// A supplied value does not expose the expected shape
    #[error("{property}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Offending property as `type.name`
        property: String,
        /// Expected kind or shape
        expected: String,
        /// Actual value type
        actual: String,
    },

    /// No value supplied and no default declared for a required property
    #[error("{property}: no value supplied and no default declared")]
    MissingValue {
        /// Offending property as `type.name`
        property: String,
    },

    /// Identity resolution found no matching object
    #[error("no existing '{object_type}' object with key {key}")]
    IdentityNotFound {
        /// Target object type
        object_type: String,
        /// Rendered key value
        key: String,
    },

    /// A create collided with an existing primary key
    #[error("'{object_type}' object with key {key} already exists")]
    DuplicateKey {
        /// Target object type
        object_type: String,
        /// Rendered key value
        key: String,
    },

    /// The named object type is not registered
    #[error("unknown object type '{name}'")]
    UnknownType {
        /// Requested type name
        name: String,
    },

    /// The schema declares no such property
    #[error("'{object_type}' has no property '{property}'")]
    UnknownProperty {
        /// Object type
        object_type: String,
        /// Requested property name
        property: String,
    },

    /// Object-graph insertion exceeded the configured nesting limit
    #[error("object graph exceeds nesting limit of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// A handle refers to a deleted row
    #[error("'{object_type}' row {row} refers to a deleted object")]
    DeadObject {
        /// Object type
        object_type: String,
        /// Row index
        row: usize,
    },

    /// Indexed access past the end of a list value
    #[error("list index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Container length
        len: usize,
    },

    /// Invariant breach inside the store
    #[error("internal error: {0}")]
    Internal(String),

    /// Schema lookup or registration failure
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl AccessorError {
    /// Type-mismatch with an untagged subject
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        AccessorError::TypeMismatch {
            property: UNTAGGED.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Unsupported-type with an untagged subject
    pub fn unsupported() -> Self {
        AccessorError::UnsupportedType {
            property: UNTAGGED.into(),
        }
    }

    /// Missing-value with an untagged subject
    pub fn missing() -> Self {
        AccessorError::MissingValue {
            property: UNTAGGED.into(),
        }
    }

    /// Tags the error with the property it was raised for.
    ///
    /// Already-tagged errors pass through unchanged, so the innermost
    /// property of a nested insertion wins.
    pub fn with_property(self, object_type: &str, property: &str) -> Self {
        let tag = || format!("{}.{}", object_type, property);
        match self {
            AccessorError::UnsupportedType { property: p } if p == UNTAGGED => {
                AccessorError::UnsupportedType { property: tag() }
            }
            AccessorError::TypeMismatch {
                property: p,
                expected,
                actual,
            } if p == UNTAGGED => AccessorError::TypeMismatch {
                property: tag(),
                expected,
                actual,
            },
            AccessorError::MissingValue { property: p } if p == UNTAGGED => {
                AccessorError::MissingValue { property: tag() }
            }
            other => other,
        }
    }

    /// The property tag, if this error carries one
    pub fn property(&self) -> Option<&str> {
        match self {
            AccessorError::UnsupportedType { property }
            | AccessorError::TypeMismatch { property, .. }
            | AccessorError::MissingValue { property } => Some(property),
            _ => None,
        }
    }
}

/// Result type for accessor operations
pub type AccessorResult<T> = Result<T, AccessorError>;
