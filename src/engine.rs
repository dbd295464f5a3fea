//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Replay the log into a fresh index before serving anything
//! - Route each command to the index or the open transaction
//! - Append one log record per committed effect before applying it

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::index::{deadline_after, Index, Timestamp, Ttl};
use crate::protocol::{Command, Reply};
use crate::txn::{apply_writes, TransactionContext};
use crate::wal::{Operation, WalEntry, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Write Ordering: log first
///
/// Every durable mutation is checked against the index, appended to the
/// log, and only then applied to the index. A failed append therefore
/// leaves memory untouched, and memory never holds an effect the log
/// does not.
///
/// Lazy expiration is not logged. Deadlines are logged as absolute times,
/// so replay reproduces them and the same keys expire on their own.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Path of the operation log
    log_path: PathBuf,

    /// Append-only operation log
    wal: WalWriter,

    /// Committed state
    index: Index,

    /// Staging buffer, present while a transaction is open
    txn: Option<TransactionContext>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const LOG_FILENAME: &'static str = "data.db";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Replay the log into a fresh index (`CorruptLog` is fatal)
    /// 3. Cut off a torn tail and resume appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        let (entries, recovery) = WalRecovery::recover(&log_path)?;

        let mut index = Index::new();
        replay(&mut index, &entries);

        tracing::info!(
            records = recovery.entries_recovered,
            last_lsn = recovery.last_lsn,
            keys = index.len(),
            "replayed log {}",
            log_path.display()
        );
        if recovery.was_truncated {
            tracing::warn!(
                valid_len = recovery.valid_len,
                corrupted = recovery.entries_corrupted,
                "log ended in a partial write; ignoring it"
            );
        }

        let wal = WalWriter::resume(&log_path, config.wal_sync_strategy, &recovery)?;

        Ok(Self {
            config,
            log_path,
            wal,
            index,
            txn: None,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Assemble an engine around an already-built index and writer
    pub fn from_parts(config: Config, index: Index, wal: WalWriter) -> Self {
        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        Self {
            config,
            log_path,
            wal,
            index,
            txn: None,
        }
    }

    /// Execute a command at time `now`
    pub fn execute(&mut self, command: Command, now: Timestamp) -> Result<Reply> {
        tracing::trace!(command = command.name(), "execute");

        let reply = match command {
            Command::Set { key, value } => {
                self.set(key, value)?;
                Reply::Ok
            }
            Command::Get { key } => Reply::Value(self.get(&key, now)),
            Command::Delete { key } => Reply::bool(self.delete(&key, now)?),
            Command::Exists { key } => Reply::bool(self.exists(&key, now)),
            Command::MSet { pairs } => {
                self.mset(pairs)?;
                Reply::Ok
            }
            Command::MGet { keys } => Reply::Values(self.mget(&keys, now)),
            Command::Range { start, end } => Reply::Keys(self.range(&start, &end, now)),
            Command::Expire { key, seconds } => Reply::bool(self.expire(&key, seconds, now)?),
            Command::Ttl { key } => Reply::Integer(self.ttl(&key, now).as_i64()),
            Command::Persist { key } => Reply::bool(self.persist(&key, now)?),
            Command::Begin => {
                self.begin()?;
                Reply::Ok
            }
            Command::Commit => {
                self.commit()?;
                Reply::Ok
            }
            Command::Abort => {
                self.abort()?;
                Reply::Ok
            }
        };

        Ok(reply)
    }

    // =========================================================================
    // Key Operations
    // =========================================================================

    /// Set a key, clearing any expiry
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        if let Some(txn) = self.txn.as_mut() {
            txn.stage_set(key, value);
            return Ok(());
        }

        self.wal.append(Operation::Set {
            key: key.clone(),
            value: value.clone(),
        })?;
        self.index.set(key, value);
        Ok(())
    }

    /// Get a value by key
    pub fn get(&mut self, key: &[u8], now: Timestamp) -> Option<Vec<u8>> {
        match self.txn.as_ref() {
            Some(txn) => txn.get(&mut self.index, key, now),
            None => self.index.get(key, now).map(<[u8]>::to_vec),
        }
    }

    /// Delete a key, reporting whether a live key was removed
    pub fn delete(&mut self, key: &[u8], now: Timestamp) -> Result<bool> {
        if let Some(txn) = self.txn.as_mut() {
            return Ok(txn.delete(&mut self.index, key, now));
        }

        if !self.index.exists(key, now) {
            return Ok(false);
        }
        self.wal.append(Operation::Delete { key: key.to_vec() })?;
        Ok(self.index.delete(key, now))
    }

    pub fn exists(&mut self, key: &[u8], now: Timestamp) -> bool {
        match self.txn.as_ref() {
            Some(txn) => txn.exists(&mut self.index, key, now),
            None => self.index.exists(key, now),
        }
    }

    /// Set several keys as one durable unit
    pub fn mset(&mut self, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        if let Some(txn) = self.txn.as_mut() {
            for (key, value) in pairs {
                txn.stage_set(key, value);
            }
            return Ok(());
        }

        if pairs.is_empty() {
            return Ok(());
        }
        self.wal.append(Operation::MultiSet {
            pairs: pairs.clone(),
        })?;
        for (key, value) in pairs {
            self.index.set(key, value);
        }
        Ok(())
    }

    /// Get several keys, in input order
    pub fn mget(&mut self, keys: &[Vec<u8>], now: Timestamp) -> Vec<Option<Vec<u8>>> {
        keys.iter().map(|key| self.get(key, now)).collect()
    }

    /// Live committed keys in `[start, end]`, ascending
    pub fn range(&mut self, start: &[u8], end: &[u8], now: Timestamp) -> Vec<Vec<u8>> {
        self.index.range(start, end, now)
    }

    /// Give a live committed key `seconds` to live
    pub fn expire(&mut self, key: &[u8], seconds: i64, now: Timestamp) -> Result<bool> {
        if !self.index.exists(key, now) {
            return Ok(false);
        }

        let expires_at = deadline_after(now, seconds);
        self.wal.append(Operation::Expire {
            key: key.to_vec(),
            expires_at,
        })?;
        Ok(self.index.expire_at(key, expires_at, now))
    }

    pub fn ttl(&mut self, key: &[u8], now: Timestamp) -> Ttl {
        match self.txn.as_ref() {
            Some(txn) => txn.ttl(&mut self.index, key, now),
            None => self.index.ttl(key, now),
        }
    }

    /// Clear the expiry of a live committed key
    pub fn persist(&mut self, key: &[u8], now: Timestamp) -> Result<bool> {
        match self.index.ttl(key, now) {
            Ttl::Missing => Ok(false),
            Ttl::Persistent => Ok(true),
            Ttl::Remaining(_) => {
                self.wal.append(Operation::Persist { key: key.to_vec() })?;
                Ok(self.index.persist(key, now))
            }
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub fn begin(&mut self) -> Result<()> {
        if self.txn.is_some() {
            return Err(LedgerError::TransactionAlreadyOpen);
        }
        self.txn = Some(TransactionContext::new());
        tracing::debug!("transaction opened");
        Ok(())
    }

    /// Log the staged writes as one record, then apply them.
    ///
    /// The transaction is closed whether or not the append succeeds; on
    /// failure none of its writes reach the index.
    pub fn commit(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or(LedgerError::NoActiveTransaction)?;
        let writes = txn.into_writes();

        if writes.is_empty() {
            tracing::debug!("committed empty transaction");
            return Ok(());
        }

        let lsn = self.wal.append(Operation::Commit {
            writes: writes.clone(),
        })?;
        apply_writes(&mut self.index, &writes);

        tracing::debug!(lsn, writes = writes.len(), "transaction committed");
        Ok(())
    }

    pub fn abort(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or(LedgerError::NoActiveTransaction)?;
        tracing::debug!(discarded = txn.len(), "transaction aborted");
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Close the engine gracefully
    ///
    /// An open transaction is discarded; the log is synced.
    pub fn close(mut self) -> Result<()> {
        if let Some(txn) = self.txn.take() {
            tracing::warn!(discarded = txn.len(), "closing with an open transaction");
        }
        self.wal.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the log file path
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// The LSN the next log record will receive
    pub fn current_lsn(&self) -> u64 {
        self.wal.current_lsn()
    }

    /// The committed index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Fold replayed records into an index, in log order
pub fn replay(index: &mut Index, entries: &[WalEntry]) {
    for entry in entries {
        apply_operation(index, &entry.operation);
    }
}

fn apply_operation(index: &mut Index, operation: &Operation) {
    match operation {
        Operation::Set { key, value } => index.set(key.clone(), value.clone()),
        Operation::Delete { key } => {
            index.remove(key);
        }
        Operation::Expire { key, expires_at } => index.restore_deadline(key, *expires_at),
        Operation::Persist { key } => index.restore_persist(key),
        Operation::MultiSet { pairs } => {
            for (key, value) in pairs {
                index.set(key.clone(), value.clone());
            }
        }
        Operation::Commit { writes } => apply_writes(index, writes),
    }
}
