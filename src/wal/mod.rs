//! Append-Only Log Module
//!
//! Provides durability through an append-only operation log.
//!
//! ## Responsibilities
//! - Append one record per committed effect, synced before acknowledging
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Replay on startup, tolerating a torn final write
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 1                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Body   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Body   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! All header integers are little-endian. The CRC covers the LSN and the
//! bincode-encoded body.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalEntry, Operation, Frame, HEADER_SIZE};
pub use writer::{LogFile, WalWriter};
pub use reader::{ReadEvent, WalReader, WalIterator};
pub use recovery::{WalRecovery, RecoveryResult};
