//! Log Recovery
//!
//! Rebuilds the committed history from the log on startup.

use std::path::Path;

use crate::error::Result;
use super::reader::{ReadEvent, WalReader};
use super::WalEntry;

/// Handles log replay after a restart or crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of checksum-failed frames dropped from the tail (0 or 1)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether bytes after the valid prefix were discarded
    pub was_truncated: bool,

    /// Length in bytes of the valid prefix
    pub valid_len: u64,
}

impl WalRecovery {
    /// Recover entries from a log file
    ///
    /// This will:
    /// 1. Read all valid entries in append order
    /// 2. Stop at a torn final write and report it
    /// 3. Fail with `CorruptLog` on damage anywhere before the tail
    ///
    /// A missing file recovers as an empty log.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        Self::fold(WalReader::open(path)?)
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::recover(path).map(|(_, result)| result)
    }

    /// Recover entries from an in-memory log image
    pub fn scan(bytes: &[u8]) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        Self::fold(WalReader::from_bytes(bytes.to_vec()))
    }

    fn fold(mut reader: WalReader) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_entry()? {
                ReadEvent::Entry(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                    result.valid_len = reader.position();
                }
                ReadEvent::End => break,
                ReadEvent::TornTail { offset, corrupted } => {
                    result.was_truncated = true;
                    result.valid_len = offset;
                    if corrupted {
                        result.entries_corrupted += 1;
                    }
                    break;
                }
            }
        }

        Ok((entries, result))
    }
}
