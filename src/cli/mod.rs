//! Command-line interface
//!
//! - check: load a schema and report its fingerprint
//! - classes: list class names
//! - induced: print the induced view of a class
//! - validate: validate JSON lines from stdin

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, SchemaSource};
pub use commands::{check, classes, induced, open_engine, run, run_command, validate, ValidateSummary};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
