//! CLI argument definitions using clap
//!
//! Commands:
//! - heliodb check-schemas --dir <path>
//! - heliodb import --schemas <path> --type <name> --file <path> [--update]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// heliodb - A schema-driven, embedded object store with a dynamic accessor layer
#[derive(Parser, Debug)]
#[command(name = "heliodb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a directory of schema files and check cross-schema links
    CheckSchemas {
        /// Directory containing `*.json` schema files
        #[arg(long)]
        dir: PathBuf,
    },

    /// Insert JSON documents through the accessor and print the stored objects
    Import {
        /// Directory containing `*.json` schema files
        #[arg(long)]
        schemas: PathBuf,

        /// Object type to insert
        #[arg(long = "type")]
        type_name: String,

        /// JSON file holding one document or an array of documents
        #[arg(long)]
        file: PathBuf,

        /// Update objects matched by primary key instead of failing on collision
        #[arg(long)]
        update: bool,

        /// Optional store configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
