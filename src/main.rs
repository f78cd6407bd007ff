//! mmschema CLI entry point
//!
//! Parses arguments, runs the command, and exits non-zero with
//! `CODE: message` on stderr if it fails. All logic lives in the CLI module.

use mmschema::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
