//! Reply definitions
//!
//! Represents the result of one command.

/// A reply to print to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement
    Ok,

    /// A single value, `None` when missing
    Value(Option<Vec<u8>>),

    /// Counts, booleans (1/0) and TTLs
    Integer(i64),

    /// One value-or-missing per requested key
    Values(Vec<Option<Vec<u8>>>),

    /// Keys from a range scan, followed by the end marker when printed
    Keys(Vec<Vec<u8>>),

    /// A failed command
    Error(String),
}

impl Reply {
    pub fn bool(flag: bool) -> Self {
        Reply::Integer(i64::from(flag))
    }

    pub fn error(message: &str) -> Self {
        Reply::Error(message.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}
