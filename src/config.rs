//! Store configuration
//!
//! Loaded from a JSON file or built in code; every field has a default so
//! an empty object is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file unreadable
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid JSON
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum depth of a nested object graph accepted by one insertion
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Directory of JSON schema files loaded at startup (optional)
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
}

fn default_max_nesting_depth() -> usize {
    64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
            schema_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
