//! CLI command implementations
//!
//! Each command resolves its configuration, loads the schema into an
//! engine, and writes JSON lines to stdout. Logs go to stderr.

use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::engine::SchemaEngine;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{RawSchema, SchemaError, MICROSCOPY_CORE_SCHEMA};

use super::args::{Cli, Command, SchemaSource};
use super::config::Config;
use super::errors::{CliErrorCode, CliResult};
use super::io::{read_requests, write_error, write_invalid, write_json, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cmd {
        Command::Check { source } => check(&open_engine(&source, false)?, &mut out),
        Command::Classes { source } => classes(&open_engine(&source, false)?, &mut out),
        Command::Induced { source, class } => {
            induced(&open_engine(&source, false)?, &class, &mut out)
        }
        Command::Validate {
            source,
            class,
            lenient,
        } => {
            let engine = open_engine(&source, lenient)?;
            let stdin = io::stdin();
            validate(&engine, &class, stdin.lock(), &mut out).map(|_| ())
        }
    }
}

/// Resolves configuration and loads the schema it names
pub fn open_engine(source: &SchemaSource, lenient: bool) -> CliResult<SchemaEngine> {
    let config = Config::resolve(source, lenient)?;
    Logger::set_min_severity(config.log_severity());

    let schema = config
        .schema_path
        .as_ref()
        .map_or_else(|| "<bundled>".to_string(), |p| p.display().to_string());
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("schema", &schema), ("log_level", &config.log_level)],
    );

    let engine = match &config.schema_path {
        Some(path) => SchemaEngine::load_file(path, config.validator_config())?,
        None => {
            let raw = RawSchema::from_json(MICROSCOPY_CORE_SCHEMA)
                .map_err(|e| SchemaError::malformed_source("<bundled>", e.to_string()))?;
            SchemaEngine::load(raw, config.validator_config())?
        }
    };
    Ok(engine)
}

/// Reports schema metadata, sizes and fingerprint
pub fn check<W: Write>(engine: &SchemaEngine, out: &mut W) -> CliResult<()> {
    let model = engine.snapshot();
    let info = model.info();

    write_response(
        out,
        json!({
            "schema": info.name,
            "version": info.version,
            "classes": model.class_count(),
            "types": model.types().count(),
            "enums": model.enums().count(),
            "fingerprint": format!("{:08x}", engine.fingerprint()),
        }),
    )
}

/// Lists class names
pub fn classes<W: Write>(engine: &SchemaEngine, out: &mut W) -> CliResult<()> {
    write_response(out, json!({ "classes": engine.list_classes() }))
}

/// Prints the canonical induced view of a class
pub fn induced<W: Write>(engine: &SchemaEngine, class: &str, out: &mut W) -> CliResult<()> {
    let export = engine.export_induced_schema(class)?;
    write_json(out, &export)
}

/// Counts of one validate run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateSummary {
    pub valid: usize,
    pub invalid: usize,
    pub malformed: usize,
}

/// Validates each input line against `class` and writes one result line per document.
///
/// A line that is not JSON gets an error line and the run continues; a
/// read failure ends the run.
pub fn validate<R: BufRead, W: Write>(
    engine: &SchemaEngine,
    class: &str,
    input: R,
    out: &mut W,
) -> CliResult<ValidateSummary> {
    // fail before reading input if the class does not exist
    engine.class_definition(class)?;
    let designator = engine.config().type_designator.clone();
    let mut summary = ValidateSummary::default();

    for request in read_requests(input) {
        let document = match request {
            Ok(document) => document,
            Err(e) if e.code() == &CliErrorCode::InvalidInput => {
                summary.malformed += 1;
                write_error(out, e.code_str(), e.message())?;
                continue;
            }
            Err(e) => return Err(e),
        };

        let result = engine.validate(&document, class)?;
        match result.instance() {
            Some(instance) => {
                summary.valid += 1;
                write_response(out, instance.to_json(&designator))?;
            }
            None => {
                summary.invalid += 1;
                write_invalid(out, &result.violations())?;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn bundled() -> SchemaEngine {
        open_engine(&SchemaSource::default(), false).unwrap()
    }

    fn lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_check_reports_bundled_schema() {
        let mut out = Vec::new();
        check(&bundled(), &mut out).unwrap();

        let response = &lines(out)[0];
        assert_eq!(response["status"], "ok");
        assert_eq!(response["data"]["schema"], "microscopemetrics_core");
        assert_eq!(response["data"]["fingerprint"].as_str().unwrap().len(), 8);
    }

    #[test]
    fn test_classes_lists_names() {
        let mut out = Vec::new();
        classes(&bundled(), &mut out).unwrap();

        let names = lines(out)[0]["data"]["classes"].clone();
        assert!(names.as_array().unwrap().contains(&json!("Polygon")));
    }

    #[test]
    fn test_induced_unknown_class() {
        let mut out = Vec::new();
        let err = induced(&bundled(), "Hexagon", &mut out).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
    }

    #[test]
    fn test_validate_lines() {
        let engine = bundled();
        let input = Cursor::new(
            "{\"x\": 1, \"y\": 2}\n\
             {\"x\": 1}\n\
             oops\n",
        );
        let mut out = Vec::new();

        let summary = validate(&engine, "Point", input, &mut out).unwrap();
        assert_eq!(
            summary,
            ValidateSummary {
                valid: 1,
                invalid: 1,
                malformed: 1
            }
        );

        let responses = lines(out);
        assert_eq!(responses[0]["status"], "ok");
        assert_eq!(responses[0]["data"]["@type"], "Point");
        assert_eq!(responses[0]["data"]["stroke_width"], 1);
        assert_eq!(responses[1]["status"], "invalid");
        assert_eq!(responses[1]["violations"][0]["kind"], "missing_required_slot");
        assert_eq!(responses[1]["violations"][0]["path"], "y");
        assert_eq!(responses[2]["status"], "error");
    }

    #[test]
    fn test_validate_from_schema_file() {
        let temp_dir = TempDir::new().unwrap();
        let schema_path: PathBuf = temp_dir.path().join("core.json");
        fs::write(&schema_path, MICROSCOPY_CORE_SCHEMA).unwrap();

        let source = SchemaSource {
            config: None,
            schema: Some(schema_path),
        };
        let engine = open_engine(&source, true).unwrap();
        assert!(!engine.config().strict_unknown_slots);

        let mut out = Vec::new();
        validate(&engine, "Vertex", Cursor::new("{\"x\":0,\"y\":0,\"note\":1}\n"), &mut out).unwrap();
        let responses = lines(out);
        assert_eq!(responses[0]["status"], "ok");
        assert!(responses[0]["data"].get("note").is_none());
    }

    #[test]
    fn test_missing_schema_file() {
        let source = SchemaSource {
            config: None,
            schema: Some(PathBuf::from("/nonexistent/schema.json")),
        };
        let err = open_engine(&source, false).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
    }
}
