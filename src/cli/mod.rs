//! CLI module for heliodb
//!
//! Provides the command-line interface:
//! - check-schemas: load a schema directory and verify links
//! - import: insert JSON documents through the accessor and print results

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{import_documents, run};
pub use errors::{CliError, CliErrorCode, CliResult};
