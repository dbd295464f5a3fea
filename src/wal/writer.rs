//! Log Writer
//!
//! Handles appending records to the log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::config::WalSyncStrategy;
use crate::error::{LedgerError, Result};
use super::recovery::{RecoveryResult, WalRecovery};
use super::{Operation, WalEntry};

/// The file operations the writer needs from its backing store
pub trait LogFile: Write + Send {
    /// Force written bytes to stable storage
    fn sync(&mut self) -> io::Result<()>;

    /// Cut the store back to `len` bytes; later writes land at the new end
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        // Opened in append mode, so the next write goes to the new end.
        self.set_len(len)
    }
}

/// Writes records to the log file
pub struct WalWriter {
    file: Box<dyn LogFile>,
    next_lsn: u64,
    len: u64,
    sync_strategy: WalSyncStrategy,
    uncommitted: usize,
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a log file, resuming after its valid prefix
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let recovery = WalRecovery::verify(path)?;
        Self::resume(path, sync_strategy, &recovery)
    }

    /// Open a log file that has already been recovered.
    ///
    /// Any torn tail past `recovery.valid_len` is cut off before the
    /// first append.
    pub fn resume(
        path: &Path,
        sync_strategy: WalSyncStrategy,
        recovery: &RecoveryResult,
    ) -> Result<Self> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        if recovery.was_truncated {
            LogFile::truncate(&mut file, recovery.valid_len)?;
            file.sync_all()?;
            tracing::warn!(
                valid_len = recovery.valid_len,
                "discarded torn tail of log {}",
                path.display()
            );
        }

        Ok(Self::from_log_file(
            Box::new(file),
            recovery.last_lsn + 1,
            recovery.valid_len,
            sync_strategy,
        ))
    }

    /// Wrap an already-positioned backing store
    pub fn from_log_file(
        file: Box<dyn LogFile>,
        next_lsn: u64,
        len: u64,
        sync_strategy: WalSyncStrategy,
    ) -> Self {
        Self {
            file,
            next_lsn,
            len,
            sync_strategy,
            uncommitted: 0,
            poisoned: false,
        }
    }

    /// Append a record to the log, returning its LSN.
    ///
    /// Under `EveryWrite` the record is on stable storage when this returns
    /// `Ok`. On failure nothing of the record is left in the file.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        if self.poisoned {
            return Err(LedgerError::WalWrite(
                "log has an unrepaired partial write; restart to recover".to_string(),
            ));
        }

        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        if let Err(e) = self.write_frame(&bytes) {
            tracing::error!(lsn, error = %e, "log append failed");
            self.rollback();
            return Err(e.into());
        }

        self.next_lsn += 1;
        self.len += bytes.len() as u64;
        Ok(lsn)
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        self.uncommitted += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if due {
            self.file.sync()?;
            self.uncommitted = 0;
        }
        Ok(())
    }

    /// Remove whatever part of a failed frame reached the file
    fn rollback(&mut self) {
        let outcome = self.file.truncate(self.len).and_then(|_| self.file.sync());
        match outcome {
            Ok(()) => {
                self.uncommitted = 0;
                tracing::debug!(len = self.len, "rolled back failed append");
            }
            Err(e) => {
                self.poisoned = true;
                tracing::error!(error = %e, "could not roll back failed append; log writer disabled");
            }
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// The LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries written since the last sync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether a failed rollback has disabled further appends
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
