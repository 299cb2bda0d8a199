//! JSON I/O handling for CLI
//!
//! Input: one JSON document on stdin. Output: one JSON object on stdout,
//! `{"status": "ok", "data": ...}` or `{"status": "error", "code", "message"}`.

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    parse_request(&input)
}

/// Parse a request document; blank input is rejected
pub fn parse_request(input: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::bad_input("Empty input"));
    }

    let value: Value = serde_json::from_str(input)?;
    Ok(value)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_json(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_json(&serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    }))
}

fn write_json(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
