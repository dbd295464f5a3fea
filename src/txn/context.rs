//! Transaction context
//!
//! The staging map plus the three-way reads over it.

use std::collections::HashMap;

use crate::index::{Index, Timestamp, Ttl};
use super::{Staged, StagedWrite};

/// Staged writes of the open transaction
#[derive(Debug, Default)]
pub struct TransactionContext {
    writes: HashMap<Vec<u8>, StagedWrite>,

    /// Keys in the order they were first staged
    order: Vec<Vec<u8>>,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&mut self, key: Vec<u8>, write: StagedWrite) {
        if !self.writes.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.writes.insert(key, write);
    }

    pub fn stage_set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.stage(key, StagedWrite::Set(value));
    }

    pub fn stage_delete(&mut self, key: Vec<u8>) {
        self.stage(key, StagedWrite::Delete);
    }

    /// Consult the staging buffer only
    pub fn lookup(&self, key: &[u8]) -> Staged<'_> {
        match self.writes.get(key) {
            None => Staged::Unset,
            Some(StagedWrite::Set(value)) => Staged::SetTo(value),
            Some(StagedWrite::Delete) => Staged::Deleted,
        }
    }

    /// Read through staging, then the index
    pub fn get(&self, index: &mut Index, key: &[u8], now: Timestamp) -> Option<Vec<u8>> {
        match self.lookup(key) {
            Staged::SetTo(value) => Some(value.to_vec()),
            Staged::Deleted => None,
            Staged::Unset => index.get(key, now).map(<[u8]>::to_vec),
        }
    }

    pub fn exists(&self, index: &mut Index, key: &[u8], now: Timestamp) -> bool {
        match self.lookup(key) {
            Staged::SetTo(_) => true,
            Staged::Deleted => false,
            Staged::Unset => index.exists(key, now),
        }
    }

    /// A staged set carries no deadline, so it reads as persistent
    pub fn ttl(&self, index: &mut Index, key: &[u8], now: Timestamp) -> Ttl {
        match self.lookup(key) {
            Staged::SetTo(_) => Ttl::Persistent,
            Staged::Deleted => Ttl::Missing,
            Staged::Unset => index.ttl(key, now),
        }
    }

    /// Stage a delete of a visible key, reporting whether it was visible
    pub fn delete(&mut self, index: &mut Index, key: &[u8], now: Timestamp) -> bool {
        if !self.exists(index, key, now) {
            return false;
        }
        self.stage_delete(key.to_vec());
        true
    }

    /// Number of distinct keys staged
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consume the context, yielding each key's final write in staged order
    pub fn into_writes(mut self) -> Vec<(Vec<u8>, StagedWrite)> {
        self.order
            .into_iter()
            .filter_map(|key| {
                let write = self.writes.remove(&key)?;
                Some((key, write))
            })
            .collect()
    }
}
