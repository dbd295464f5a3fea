//! Protocol codec
//!
//! Parsing request lines and rendering replies.
//!
//! ## Reply Format
//! ```text
//! OK                      acknowledgement
//! <value> | NULL          single value
//! <integer>               counts, booleans, TTLs
//! <line per value>        MGET
//! <line per key>\nEND     RANGE
//! ERR <message>           failure
//! ```

use std::io::Write;

use crate::error::{LedgerError, Result};
use super::{Command, Reply};

/// Printed for a missing key
pub const MISSING: &str = "NULL";

/// Printed after the last key of a RANGE
pub const END_MARKER: &str = "END";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank line, ignored
    Empty,

    /// End the session
    Exit,

    Command(Command),
}

// =============================================================================
// Request Parsing
// =============================================================================

/// Parse one input line
pub fn parse_line(line: &str) -> Result<Line> {
    let (name, rest) = split_word(line);
    if name.is_empty() {
        return Ok(Line::Empty);
    }

    let name = name.to_ascii_uppercase();
    let command = match name.as_str() {
        "EXIT" | "QUIT" => {
            expect_args(&name, rest, 0)?;
            return Ok(Line::Exit);
        }
        "SET" => {
            let (key, value) = split_word(rest);
            let value = value.trim_end();
            if key.is_empty() || value.is_empty() {
                return Err(arity_error(&name));
            }
            Command::Set {
                key: key.as_bytes().to_vec(),
                value: value.as_bytes().to_vec(),
            }
        }
        "GET" => Command::Get { key: single_key(&name, rest)? },
        "DEL" => Command::Delete { key: single_key(&name, rest)? },
        "EXISTS" => Command::Exists { key: single_key(&name, rest)? },
        "TTL" => Command::Ttl { key: single_key(&name, rest)? },
        "PERSIST" => Command::Persist { key: single_key(&name, rest)? },
        "MSET" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            if args.is_empty() || args.len() % 2 != 0 {
                return Err(arity_error(&name));
            }
            let pairs = args
                .chunks_exact(2)
                .map(|pair| (pair[0].as_bytes().to_vec(), pair[1].as_bytes().to_vec()))
                .collect();
            Command::MSet { pairs }
        }
        "MGET" => {
            let keys: Vec<Vec<u8>> = rest
                .split_whitespace()
                .map(|key| key.as_bytes().to_vec())
                .collect();
            if keys.is_empty() {
                return Err(arity_error(&name));
            }
            Command::MGet { keys }
        }
        "RANGE" => {
            let args = expect_args(&name, rest, 2)?;
            Command::Range {
                start: args[0].as_bytes().to_vec(),
                end: args[1].as_bytes().to_vec(),
            }
        }
        "EXPIRE" => {
            let args = expect_args(&name, rest, 2)?;
            let seconds = args[1].parse::<i64>().map_err(|_| {
                LedgerError::Protocol(format!("EXPIRE: '{}' is not an integer", args[1]))
            })?;
            Command::Expire {
                key: args[0].as_bytes().to_vec(),
                seconds,
            }
        }
        "BEGIN" => {
            expect_args(&name, rest, 0)?;
            Command::Begin
        }
        "COMMIT" => {
            expect_args(&name, rest, 0)?;
            Command::Commit
        }
        "ABORT" => {
            expect_args(&name, rest, 0)?;
            Command::Abort
        }
        _ => {
            return Err(LedgerError::Protocol(format!("unknown command '{}'", name)));
        }
    };

    Ok(Line::Command(command))
}

/// Split off the first whitespace-delimited word
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(at) => (&input[..at], input[at..].trim_start()),
        None => (input, ""),
    }
}

fn expect_args<'a>(name: &str, rest: &'a str, count: usize) -> Result<Vec<&'a str>> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    if args.len() != count {
        return Err(arity_error(name));
    }
    Ok(args)
}

fn single_key(name: &str, rest: &str) -> Result<Vec<u8>> {
    let args = expect_args(name, rest, 1)?;
    Ok(args[0].as_bytes().to_vec())
}

fn arity_error(name: &str) -> LedgerError {
    LedgerError::Protocol(format!("wrong number of arguments for {}", name))
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Render a reply as text lines (no trailing newline)
pub fn encode_reply(reply: &Reply) -> String {
    match reply {
        Reply::Ok => "OK".to_string(),
        Reply::Value(value) => render_value(value.as_deref()),
        Reply::Integer(n) => n.to_string(),
        Reply::Values(values) => values
            .iter()
            .map(|value| render_value(value.as_deref()))
            .collect::<Vec<_>>()
            .join("\n"),
        Reply::Keys(keys) => {
            let mut lines: Vec<String> = keys
                .iter()
                .map(|key| String::from_utf8_lossy(key).into_owned())
                .collect();
            lines.push(END_MARKER.to_string());
            lines.join("\n")
        }
        Reply::Error(message) => format!("ERR {}", message),
    }
}

fn render_value(value: Option<&[u8]>) -> String {
    match value {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => MISSING.to_string(),
    }
}

/// Write a reply to a stream, newline-terminated
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    writeln!(writer, "{}", encode_reply(reply))?;
    writer.flush()?;
    Ok(())
}
