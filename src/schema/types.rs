//! Schema type definitions
//!
//! An object schema is an ordered list of property descriptors plus an
//! optional primary key. Property order is significant: it is the order in
//! which the accessor writes columns during object materialization.
//!
//! Supported property kinds:
//! - bool, int (64-bit), float (32-bit), double (64-bit)
//! - string, data (binary), date (UTC timestamp)
//! - object: link to a single object of a target type
//! - list: links to many objects of a target type
//! - any: declarable but unwritable (the accessor rejects it)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage kind of a single property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PropertyKind {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// UTF-8 string
    String,
    /// Opaque binary data
    Data,
    /// UTC timestamp
    Date,
    /// Link to a single object of the target type
    Object {
        /// Target object type name
        target: String,
    },
    /// Links to many objects of the target type
    List {
        /// Target object type name
        target: String,
    },
    /// Untyped union column; declarable but never writable
    Any,
}

impl PropertyKind {
    /// Returns the kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
            PropertyKind::Double => "double",
            PropertyKind::String => "string",
            PropertyKind::Data => "data",
            PropertyKind::Date => "date",
            PropertyKind::Object { .. } => "object",
            PropertyKind::List { .. } => "list",
            PropertyKind::Any => "any",
        }
    }

    /// Returns the link target for object and list kinds
    pub fn link_target(&self) -> Option<&str> {
        match self {
            PropertyKind::Object { target } | PropertyKind::List { target } => Some(target),
            _ => None,
        }
    }

    /// Whether this kind may carry a primary key
    pub fn keyable(&self) -> bool {
        matches!(self, PropertyKind::Int | PropertyKind::String)
    }
}

/// Default value declaration for a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSpec {
    /// A literal value, coerced like any supplied value
    Value(Value),
    /// A fresh UUID string, resolved at most once per accessor context
    GeneratedId,
}

/// A single property descriptor
///
/// The property's index is its position in the schema's property vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Declared storage kind
    #[serde(flatten)]
    pub kind: PropertyKind,
    /// Whether the property may hold null
    #[serde(default)]
    pub optional: bool,
    /// Declared default, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultSpec>,
}

impl Property {
    /// Create a required property
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default: None,
        }
    }

    /// Mark the property optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attach a default declaration
    pub fn with_default(mut self, default: DefaultSpec) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether a default is declared
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Complete object schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    /// Unique object type name
    pub name: String,
    /// Schema version label
    #[serde(default = "default_version")]
    pub version: String,
    /// Name of the primary-key property, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Ordered property descriptors
    pub properties: Vec<Property>,
}

fn default_version() -> String {
    "1".to_string()
}

impl ObjectSchema {
    /// Create a new schema
    pub fn new(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            primary_key: None,
            properties,
        }
    }

    /// Set the primary-key property name
    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    /// Look up a property by name, returning its index and descriptor
    pub fn property(&self, name: &str) -> Option<(usize, &Property)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
    }

    /// Look up a property by index
    pub fn property_at(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// The primary-key property, if declared
    pub fn primary_key_property(&self) -> Option<(usize, &Property)> {
        self.primary_key.as_deref().and_then(|pk| self.property(pk))
    }

    /// Validates the schema structure itself (not a value)
    pub fn validate_structure(&self) -> Result<(), String> {
        if !is_identifier(&self.name) {
            return Err(format!("'{}' is not a valid type name", self.name));
        }

        if self.properties.is_empty() {
            return Err("schema must declare at least one property".into());
        }

        for (i, prop) in self.properties.iter().enumerate() {
            if !is_identifier(&prop.name) {
                return Err(format!("'{}' is not a valid property name", prop.name));
            }
            if self.properties[..i].iter().any(|p| p.name == prop.name) {
                return Err(format!("duplicate property '{}'", prop.name));
            }
            if let Some(target) = prop.kind.link_target() {
                if !is_identifier(target) {
                    return Err(format!(
                        "property '{}' links to invalid type name '{}'",
                        prop.name, target
                    ));
                }
            }
        }

        if let Some(pk) = &self.primary_key {
            let (_, prop) = self
                .property(pk)
                .ok_or_else(|| format!("primary key '{}' is not a declared property", pk))?;
            if !prop.kind.keyable() {
                return Err(format!(
                    "primary key '{}' must be int or string, not {}",
                    pk,
                    prop.kind.kind_name()
                ));
            }
            if prop.optional {
                return Err(format!("primary key '{}' cannot be optional", pk));
            }
        }

        Ok(())
    }
}

/// Whether a name is usable as a type or property identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
