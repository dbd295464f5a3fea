//! Index Module
//!
//! Authoritative in-memory state: every live key, its value and its deadline.
//!
//! ## Responsibilities
//! - Point reads and writes
//! - Per-key TTL with lazy expiration
//! - Ordered iteration for inclusive range scans
//!
//! ## Data Structure Choice
//! A BTreeMap keyed by raw bytes:
//! - Keys compare lexicographically, which is the order RANGE reports
//! - One thread of control owns the index, so no lock wraps it
//!
//! Time is never read here. Every call that needs it takes `now`.

mod table;

pub use table::Index;

/// Milliseconds since the unix epoch
pub type Timestamp = u64;

pub const MILLIS_PER_SECOND: u64 = 1_000;

/// State of one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: Vec<u8>,

    /// Absolute deadline; `None` means the key never expires
    pub expires_at: Option<Timestamp>,
}

/// Whether an entry is visible at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    Expired,
}

/// Answer to a TTL query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Missing or expired
    Missing,

    /// Live with no deadline
    Persistent,

    /// Whole seconds left, rounded down
    Remaining(u64),
}

impl Entry {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// An entry is expired once `now` reaches its deadline
    pub fn liveness(&self, now: Timestamp) -> Liveness {
        match self.expires_at {
            Some(deadline) if deadline <= now => Liveness::Expired,
            _ => Liveness::Live,
        }
    }

    /// TTL of a live entry
    pub fn ttl(&self, now: Timestamp) -> Ttl {
        match self.expires_at {
            None => Ttl::Persistent,
            Some(deadline) => Ttl::Remaining(deadline.saturating_sub(now) / MILLIS_PER_SECOND),
        }
    }
}

impl Ttl {
    /// Integer form used on the wire: seconds, `-1` for no deadline, `-2` for missing
    pub fn as_i64(self) -> i64 {
        match self {
            Ttl::Missing => -2,
            Ttl::Persistent => -1,
            Ttl::Remaining(secs) => i64::try_from(secs).unwrap_or(i64::MAX),
        }
    }
}

/// Deadline for a key given `seconds` to live from `now`.
/// Non-positive durations expire the key immediately.
pub fn deadline_after(now: Timestamp, seconds: i64) -> Timestamp {
    if seconds <= 0 {
        return now;
    }
    now.saturating_add((seconds as u64).saturating_mul(MILLIS_PER_SECOND))
}
