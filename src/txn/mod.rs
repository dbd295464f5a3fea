//! Transaction Module
//!
//! Staging buffer for one open transaction.
//!
//! ## Responsibilities
//! - Hold SET/DEL writes until COMMIT, with no index or log effect
//! - Read-your-writes: staged state shadows the index
//! - Hand the net effect to the engine, in staged order, at COMMIT
//!
//! ## Lookup
//! ```text
//!   staged?  ── SetTo(v) ──▶ v
//!      │     ── Deleted  ──▶ missing
//!      ▼ Unset
//!   index    ── live     ──▶ value
//!            ── absent / expired ──▶ missing
//! ```
//!
//! A staged delete is stored explicitly so it can mask a live key.

mod context;

pub use context::TransactionContext;

use serde::{Deserialize, Serialize};

use crate::index::Index;

/// A write held in the staging buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagedWrite {
    Set(Vec<u8>),
    Delete,
}

/// Result of consulting the staging buffer for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged<'a> {
    /// Not touched by this transaction
    Unset,
    SetTo(&'a [u8]),
    Deleted,
}

/// Apply committed writes to the index, in order
pub fn apply_writes(index: &mut Index, writes: &[(Vec<u8>, StagedWrite)]) {
    for (key, write) in writes {
        match write {
            StagedWrite::Set(value) => index.set(key.clone(), value.clone()),
            StagedWrite::Delete => {
                index.remove(key);
            }
        }
    }
}
