//! Index implementation
//!
//! BTreeMap-based index with lazy expiration.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::{deadline_after, Entry, Liveness, Timestamp, Ttl};

/// In-memory mapping from key to entry
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<Vec<u8>, Entry>,
}

impl Index {
    /// Create a new empty Index
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live entry, removing it first if it has expired
    fn live_entry(&mut self, key: &[u8], now: Timestamp) -> Option<&mut Entry> {
        let liveness = self.entries.get(key)?.liveness(now);
        if liveness == Liveness::Expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    /// Get a value by key
    pub fn get(&mut self, key: &[u8], now: Timestamp) -> Option<&[u8]> {
        self.live_entry(key, now).map(|entry| entry.value.as_slice())
    }

    /// Insert or overwrite a key. Any previous deadline is dropped.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, Entry::new(value));
    }

    /// Remove a key, reporting whether a live key was removed
    pub fn delete(&mut self, key: &[u8], now: Timestamp) -> bool {
        if self.live_entry(key, now).is_none() {
            return false;
        }
        self.entries.remove(key).is_some()
    }

    pub fn exists(&mut self, key: &[u8], now: Timestamp) -> bool {
        self.live_entry(key, now).is_some()
    }

    /// Give a live key `seconds` to live
    pub fn expire(&mut self, key: &[u8], seconds: i64, now: Timestamp) -> bool {
        self.expire_at(key, deadline_after(now, seconds), now)
    }

    /// Give a live key an absolute deadline
    pub fn expire_at(&mut self, key: &[u8], deadline: Timestamp, now: Timestamp) -> bool {
        match self.live_entry(key, now) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                true
            }
            None => false,
        }
    }

    pub fn ttl(&mut self, key: &[u8], now: Timestamp) -> Ttl {
        match self.live_entry(key, now) {
            Some(entry) => entry.ttl(now),
            None => Ttl::Missing,
        }
    }

    /// Clear the deadline of a live key
    pub fn persist(&mut self, key: &[u8], now: Timestamp) -> bool {
        match self.live_entry(key, now) {
            Some(entry) => {
                entry.expires_at = None;
                true
            }
            None => false,
        }
    }

    /// Live keys in `[start, end]`, ascending. Expired keys met on the way
    /// are removed.
    pub fn range(&mut self, start: &[u8], end: &[u8], now: Timestamp) -> Vec<Vec<u8>> {
        if start > end {
            return Vec::new();
        }

        let mut keys = Vec::new();
        let mut expired = Vec::new();
        let bounds = (Bound::Included(start), Bound::Included(end));
        for (key, entry) in self.entries.range::<[u8], _>(bounds) {
            match entry.liveness(now) {
                Liveness::Live => keys.push(key.clone()),
                Liveness::Expired => expired.push(key.clone()),
            }
        }

        for key in expired {
            self.entries.remove(&key);
        }
        keys
    }

    // =========================================================================
    // Replay
    // =========================================================================
    //
    // Replay has no clock. A logged record was valid when it was written, so
    // these apply it to whatever entry is physically present.

    /// Set the deadline of a present key without a liveness check
    pub fn restore_deadline(&mut self, key: &[u8], deadline: Timestamp) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
    }

    /// Clear the deadline of a present key without a liveness check
    pub fn restore_persist(&mut self, key: &[u8]) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = None;
        }
    }

    /// Remove a key without a liveness check
    pub fn remove(&mut self, key: &[u8]) -> Option<Entry> {
        self.entries.remove(key)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Number of stored entries, including expired ones not yet touched
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored entries in key order, including expired ones not yet touched
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Entry)> {
        self.entries.iter()
    }
}
