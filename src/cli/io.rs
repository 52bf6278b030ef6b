//! JSON I/O handling for the CLI
//!
//! - Input: one JSON request per line (session mode)
//! - Output: one JSON object per line on stdout
//! - Logs go to stderr and never interleave with responses

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Non-blank input lines, trimmed
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<String>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(Ok(line.trim().to_string())),
        Err(e) => Some(Err(CliError::from(e))),
    })
}

/// Write one line and flush
pub fn write_line<W: Write>(out: &mut W, line: &str) -> CliResult<()> {
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": data
    });
    write_json(&response.to_string())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_json(&response.to_string())
}

/// Write preformatted text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Write a raw JSON string to stdout
pub fn write_json(json_str: &str) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_line(&mut out, json_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_lines_skips_blank() {
        let input = Cursor::new("{\"op\": \"state\"}\n\n   \n {\"op\": \"list\"} \n");
        let lines: Vec<String> = read_lines(input).map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["{\"op\": \"state\"}", "{\"op\": \"list\"}"]);
    }

    #[test]
    fn test_write_line() {
        let mut out = Vec::new();
        write_line(&mut out, "{}").unwrap();
        assert_eq!(out, b"{}\n");
    }
}
