//! # LedgerKV
//!
//! A single-node persistent key-value store with:
//! - An append-only operation log, synced before each acknowledgement
//! - Replay on startup that tolerates a torn final write
//! - Per-key TTLs with lazy expiration
//! - Single-transaction staging with atomic commit and abort
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Shell Session                             │
//! │            (one line in, one reply out)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command + now
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │        (routes to index or open transaction)                 │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!   ┌─────────┐          ┌─────────────┐        ┌────────────┐
//!   │   Log   │          │ Transaction │───────▶│   Index    │
//!   │(Append) │          │  (Staging)  │ shadow │ (BTreeMap) │
//!   └─────────┘          └─────────────┘        └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod index;
pub mod txn;
pub mod protocol;
pub mod engine;
pub mod shell;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LedgerError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LedgerKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
