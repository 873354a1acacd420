//! Schema error types
//!
//! Error codes:
//! - HELIO_UNKNOWN_SCHEMA (REJECT)
//! - HELIO_SCHEMA_EXISTS (REJECT)
//! - HELIO_INVALID_SCHEMA (REJECT)
//! - HELIO_MALFORMED_SCHEMA_FILE (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected
    Reject,
    /// Startup must abort (loader errors)
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Object type not registered
    HelioUnknownSchema,
    /// Object type already registered; schemas are immutable
    HelioSchemaExists,
    /// Schema structure violates declaration rules
    HelioInvalidSchema,
    /// Schema file unreadable or not valid schema JSON
    HelioMalformedSchemaFile,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::HelioUnknownSchema => "HELIO_UNKNOWN_SCHEMA",
            SchemaErrorCode::HelioSchemaExists => "HELIO_SCHEMA_EXISTS",
            SchemaErrorCode::HelioInvalidSchema => "HELIO_INVALID_SCHEMA",
            SchemaErrorCode::HelioMalformedSchemaFile => "HELIO_MALFORMED_SCHEMA_FILE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::HelioMalformedSchemaFile => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(code: SchemaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Object type not registered
    pub fn unknown_schema(name: &str) -> Self {
        Self::new(
            SchemaErrorCode::HelioUnknownSchema,
            format!("no schema registered for type '{}'", name),
        )
    }

    /// Object type already registered
    pub fn schema_exists(name: &str) -> Self {
        Self::new(
            SchemaErrorCode::HelioSchemaExists,
            format!("schema '{}' is already registered", name),
        )
    }

    /// Schema structure violates declaration rules
    pub fn invalid_schema(name: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            SchemaErrorCode::HelioInvalidSchema,
            format!("schema '{}' is invalid: {}", name, detail),
        )
    }

    /// Schema file unreadable or not valid schema JSON
    pub fn malformed_schema_file(path: impl fmt::Display, detail: impl fmt::Display) -> Self {
        Self::new(
            SchemaErrorCode::HelioMalformedSchemaFile,
            format!("{}: {}", path, detail),
        )
    }

    /// Get the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Get the severity
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
