//! Log Reader
//!
//! Walks the frames of a log image from the front, classifying each one.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{LedgerError, Result};
use super::entry::Frame;
use super::WalEntry;

/// What the reader found at its current position
#[derive(Debug)]
pub enum ReadEvent {
    /// A valid record
    Entry(WalEntry),

    /// Clean end of the log
    End,

    /// The remaining bytes are an unfinished final write.
    /// `offset` is where valid history ends.
    TornTail { offset: u64, corrupted: bool },
}

/// Reads records from a log image held in memory
pub struct WalReader {
    data: Vec<u8>,
    position: usize,
    last_lsn: u64,
    finished: bool,
}

impl WalReader {
    /// Open a log file for reading. A missing file reads as an empty log.
    pub fn open(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::from_bytes(data))
    }

    /// Read from an in-memory log image
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            last_lsn: 0,
            finished: false,
        }
    }

    /// Byte offset of the next unread frame
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    /// Read the next record.
    ///
    /// A bad frame is a torn write only when nothing but zero bytes follows
    /// it. Anything else fails with `CorruptLog` instead of ending the scan.
    pub fn next_entry(&mut self) -> Result<ReadEvent> {
        if self.finished {
            return Ok(ReadEvent::End);
        }

        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            self.finished = true;
            return Ok(ReadEvent::End);
        }

        match WalEntry::decode_frame(remaining) {
            Frame::Complete { entry, len } => {
                if entry.lsn <= self.last_lsn {
                    let reason = format!(
                        "lsn {} does not follow lsn {}",
                        entry.lsn, self.last_lsn
                    );
                    return self.torn_or_corrupt(len, reason);
                }
                self.last_lsn = entry.lsn;
                self.position += len;
                Ok(ReadEvent::Entry(entry))
            }
            Frame::Incomplete => {
                self.finished = true;
                Ok(ReadEvent::TornTail {
                    offset: self.position as u64,
                    corrupted: false,
                })
            }
            Frame::Corrupt { len, reason } => self.torn_or_corrupt(len, reason),
            Frame::BadHeader { reason } => self.torn_or_corrupt(0, reason),
        }
    }

    /// Classify a bad frame at the current position.
    ///
    /// `len` is how much of it is known to belong to the frame. The bytes
    /// after that must all be zero (space a crash allocated but never
    /// filled) for the frame to count as the torn tail.
    fn torn_or_corrupt(&mut self, len: usize, reason: String) -> Result<ReadEvent> {
        let trailing = &self.data[self.position + len..];
        if trailing.iter().any(|&byte| byte != 0) {
            return Err(LedgerError::CorruptLog(format!(
                "{} (offset {}, {} bytes follow)",
                reason,
                self.position,
                trailing.len()
            )));
        }

        self.finished = true;
        Ok(ReadEvent::TornTail {
            offset: self.position as u64,
            corrupted: true,
        })
    }

    /// Iterate over all valid entries, stopping at the end of valid history
    pub fn entries(self) -> WalIterator {
        WalIterator { reader: self }
    }
}

/// Iterator over log entries
pub struct WalIterator {
    reader: WalReader,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_entry() {
            Ok(ReadEvent::Entry(entry)) => Some(Ok(entry)),
            Ok(ReadEvent::End) | Ok(ReadEvent::TornTail { .. }) => None,
            Err(e) => {
                self.reader.finished = true;
                Some(Err(e))
            }
        }
    }
}
