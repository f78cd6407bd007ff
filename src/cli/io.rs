//! JSON line I/O for the CLI
//!
//! - Input: one JSON document per line, blank lines skipped
//! - Output: one JSON object per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Reads JSON documents from `reader`, one per non-blank line.
///
/// A line that is not JSON yields `InvalidInput`; a read failure yields `IoError`.
pub fn read_requests<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Value>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(
            serde_json::from_str(&line)
                .map_err(|e| CliError::invalid_input(format!("Invalid JSON: {}", e))),
        ),
        Err(e) => Some(Err(CliError::from(e))),
    })
}

/// Writes `{"status":"ok","data":...}`
pub fn write_response<W: Write>(writer: &mut W, data: Value) -> CliResult<()> {
    write_line(writer, &json!({"status": "ok", "data": data}))
}

/// Writes `{"status":"invalid","violations":[...]}`
pub fn write_invalid<W: Write, V: Serialize>(writer: &mut W, violations: &V) -> CliResult<()> {
    write_line(
        writer,
        &json!({"status": "invalid", "violations": serde_json::to_value(violations)?}),
    )
}

/// Writes `{"status":"error","code":...,"message":...}`
pub fn write_error<W: Write>(writer: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_line(
        writer,
        &json!({"status": "error", "code": code, "message": message}),
    )
}

/// Writes pre-rendered JSON text as is
pub fn write_json<W: Write>(writer: &mut W, json_str: &str) -> CliResult<()> {
    writeln!(writer, "{}", json_str)?;
    writer.flush()?;
    Ok(())
}

fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use std::io::Cursor;

    #[test]
    fn test_read_skips_blank_lines() {
        let input = Cursor::new("{\"a\":1}\n\n   \n[2]\n");
        let values: Vec<Value> = read_requests(input).map(Result::unwrap).collect();
        assert_eq!(values, vec![json!({"a": 1}), json!([2])]);
    }

    #[test]
    fn test_read_reports_bad_line() {
        let input = Cursor::new("{\"a\":1}\nnot json\n");
        let results: Vec<CliResult<Value>> = read_requests(input).collect();
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidInput);
    }

    #[test]
    fn test_write_shapes() {
        let mut out = Vec::new();
        write_response(&mut out, json!({"x": 1})).unwrap();
        write_invalid(&mut out, &vec![json!({"kind": "unknown_slot", "path": "q"})]).unwrap();
        write_error(&mut out, "MM_CLI_INVALID_INPUT", "bad").unwrap();

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[1]["violations"][0]["path"], "q");
        assert_eq!(lines[2]["code"], "MM_CLI_INVALID_INPUT");
    }
}
