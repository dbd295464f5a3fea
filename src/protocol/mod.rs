//! Protocol Module
//!
//! Line-oriented text protocol between a user and the engine.
//!
//! ## Request Format
//! One command per line. Names are case-insensitive; arguments are
//! separated by whitespace. `SET` takes the rest of the line as its value.
//!
//! ### Commands
//! - `SET key value`        → `OK`
//! - `GET key`              → value or `NULL`
//! - `DEL key`              → `1` / `0`
//! - `EXISTS key`           → `1` / `0`
//! - `MSET k v [k v ...]`   → `OK`
//! - `MGET k [k ...]`       → one value-or-`NULL` line per key
//! - `RANGE start end`      → one key per line, then `END`
//! - `EXPIRE key seconds`   → `1` / `0`
//! - `TTL key`              → seconds, `-1` or `-2`
//! - `PERSIST key`          → `1` / `0`
//! - `BEGIN` / `COMMIT` / `ABORT` → `OK`
//! - `EXIT` / `QUIT`        → ends the session
//!
//! ### Errors
//! Failures print a single `ERR <message>` line.

mod command;
mod response;
mod codec;

pub use command::Command;
pub use response::Reply;
pub use codec::{encode_reply, parse_line, write_reply, Line, END_MARKER, MISSING};
