//! Command definitions
//!
//! Represents one decoded operation handed to the engine.

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a key, clearing any expiry
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Get a value by key
    Get { key: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Check whether a key is live
    Exists { key: Vec<u8> },

    /// Set several keys at once
    MSet { pairs: Vec<(Vec<u8>, Vec<u8>)> },

    /// Get several keys, answering in input order
    MGet { keys: Vec<Vec<u8>> },

    /// Live keys in `[start, end]`
    Range { start: Vec<u8>, end: Vec<u8> },

    /// Give a key `seconds` to live
    Expire { key: Vec<u8>, seconds: i64 },

    /// Seconds left on a key
    Ttl { key: Vec<u8> },

    /// Remove a key's expiry
    Persist { key: Vec<u8> },

    Begin,
    Commit,
    Abort,
}

impl Command {
    /// Upper-case command name as typed by users
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Delete { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::MSet { .. } => "MSET",
            Command::MGet { .. } => "MGET",
            Command::Range { .. } => "RANGE",
            Command::Expire { .. } => "EXPIRE",
            Command::Ttl { .. } => "TTL",
            Command::Persist { .. } => "PERSIST",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
        }
    }

    /// Whether executing this command may append to the log
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Set { .. }
                | Command::Delete { .. }
                | Command::MSet { .. }
                | Command::Expire { .. }
                | Command::Persist { .. }
                | Command::Commit
        )
    }
}
