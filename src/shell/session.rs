//! Session Handler
//!
//! Drives one line-oriented session against the engine.

use std::io::{BufRead, Write};

use crate::engine::Engine;
use crate::error::{LedgerError, Result};
use crate::protocol::{parse_line, write_reply, Command, Line, Reply};
use super::Clock;

/// What to do after one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to print
    Skip,

    /// Print this reply and read the next line
    Reply(Reply),

    /// End the session
    Exit,
}

/// Counters for a finished session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Commands that reached the engine
    pub commands: u64,

    /// Lines answered with `ERR`
    pub errors: u64,

    /// Write commands that succeeded
    pub writes: u64,
}

/// A single user session
pub struct Session<'e, C: Clock> {
    engine: &'e mut Engine,
    clock: C,
    stats: SessionStats,
}

impl<'e, C: Clock> Session<'e, C> {
    pub fn new(engine: &'e mut Engine, clock: C) -> Self {
        Self {
            engine,
            clock,
            stats: SessionStats::default(),
        }
    }

    /// Handle the session (blocking until EXIT or end of input)
    ///
    /// A failed command is answered with `ERR` and the session goes on,
    /// and so is a line that is not valid UTF-8. Only I/O errors on the
    /// session streams end it early.
    pub fn run<R: BufRead, W: Write>(&mut self, mut reader: R, writer: &mut W) -> Result<SessionStats> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let step = match std::str::from_utf8(trim_newline(&buf)) {
                Ok(line) => self.handle_line(line),
                Err(_) => self.reject(LedgerError::Protocol(
                    "input line is not valid UTF-8".to_string(),
                )),
            };

            match step {
                Step::Skip => continue,
                Step::Exit => {
                    tracing::debug!("session ended by EXIT");
                    break;
                }
                Step::Reply(reply) => write_reply(writer, &reply)?,
            }
        }

        Ok(self.stats)
    }

    /// Parse and execute one line
    pub fn handle_line(&mut self, line: &str) -> Step {
        match parse_line(line) {
            Ok(Line::Empty) => Step::Skip,
            Ok(Line::Exit) => Step::Exit,
            Ok(Line::Command(command)) => {
                let reply = self.execute(command);
                self.respond(reply)
            }
            Err(e) => self.reject(e),
        }
    }

    fn execute(&mut self, command: Command) -> Reply {
        self.stats.commands += 1;
        let name = command.name();
        let is_write = command.is_write();

        match self.engine.execute(command, self.clock.now()) {
            Ok(reply) => {
                if is_write {
                    self.stats.writes += 1;
                }
                reply
            }
            Err(e) => {
                if e.is_durability_failure() {
                    tracing::error!(command = name, error = %e, "write not committed");
                } else {
                    tracing::debug!(command = name, error = %e, "command failed");
                }
                Reply::error(&e.to_string())
            }
        }
    }

    fn reject(&mut self, error: LedgerError) -> Step {
        tracing::debug!(error = %error, "rejected input line");
        self.respond(Reply::error(&error.to_string()))
    }

    fn respond(&mut self, reply: Reply) -> Step {
        if reply.is_error() {
            self.stats.errors += 1;
        }
        Step::Reply(reply)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

/// Strip a trailing `\n` or `\r\n`
fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
