//! CLI argument definitions using clap
//!
//! Commands:
//! - mmschema check [--config <path>] [--schema <path>]
//! - mmschema classes [--config <path>] [--schema <path>]
//! - mmschema induced --class <name> [--config <path>] [--schema <path>]
//! - mmschema validate --class <name> [--lenient] [--config <path>] [--schema <path>]
//!
//! Without `--schema` or a `schema_path` in the config, the bundled
//! microscopy core schema is used.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// mmschema - schema resolution and validation for microscopy QC records
#[derive(Parser, Debug)]
#[command(name = "mmschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the schema and settings come from
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaSource {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Schema file; overrides `schema_path` from the configuration
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the schema and report its size and fingerprint
    Check {
        #[command(flatten)]
        source: SchemaSource,
    },

    /// List class names
    Classes {
        #[command(flatten)]
        source: SchemaSource,
    },

    /// Print the canonical induced view of a class
    Induced {
        #[command(flatten)]
        source: SchemaSource,

        /// Class to resolve
        #[arg(long)]
        class: String,
    },

    /// Validate JSON documents read from stdin, one per line
    Validate {
        #[command(flatten)]
        source: SchemaSource,

        /// Class every document is validated against
        #[arg(long)]
        class: String,

        /// Drop undeclared slots instead of rejecting them
        #[arg(long)]
        lenient: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from([
            "mmschema",
            "validate",
            "--class",
            "ROI",
            "--lenient",
            "--schema",
            "core.json",
        ]);
        match cli.command {
            Command::Validate { source, class, lenient } => {
                assert_eq!(class, "ROI");
                assert!(lenient);
                assert_eq!(source.schema, Some(PathBuf::from("core.json")));
                assert_eq!(source.config, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_induced_requires_class() {
        assert!(Cli::try_parse_from(["mmschema", "induced"]).is_err());
    }
}
