//! Cache Store Module
//!
//! Keyed TTL storage with lazy expiry and a non-evicting stale accessor.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheEntry, Clock, EntryState, SystemClock};

// == Snapshot ==
/// A value read together with its state and remaining TTL, all taken from
/// the same clock reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<V> {
    pub value: V,
    pub state: EntryState,
    /// Whole seconds until expiry, 0 once expired
    pub ttl: u64,
}

// == TTL Cache ==
/// In-memory key/value store with per-entry expiration.
///
/// Reads never remove entries. An expired entry stays in the map until it is
/// overwritten or explicitly removed, which keeps the last computed value
/// available to [`TtlCache::get_stale`].
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates an empty cache driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_seconds`.
    ///
    /// Any existing entry for the key is replaced and its TTL reset.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_seconds: u64) {
        let entry = CacheEntry::new(value, ttl_seconds, self.clock.now_ms());
        self.entries.insert(key.into(), entry);
    }

    // == State ==
    /// Returns the freshness of `key` right now.
    pub fn state(&self, key: &str) -> EntryState {
        match self.entries.get(key) {
            Some(entry) => entry.state_at(self.clock.now_ms()),
            None => EntryState::Absent,
        }
    }

    // == Snapshot ==
    /// Reads value, state and remaining TTL of `key` in one step.
    pub fn snapshot(&self, key: &str) -> Option<Snapshot<V>> {
        let entry = self.entries.get(key)?;
        let now = self.clock.now_ms();
        Some(Snapshot {
            value: entry.value.clone(),
            state: entry.state_at(now),
            ttl: entry.ttl_remaining(now),
        })
    }

    // == Get ==
    /// Returns the value only while it is fresh.
    pub fn get(&self, key: &str) -> Option<V> {
        self.snapshot(key)
            .filter(|snap| snap.state == EntryState::Fresh)
            .map(|snap| snap.value)
    }

    // == Get Stale ==
    /// Returns the last stored value regardless of expiry.
    pub fn get_stale(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Remaining TTL ==
    /// Whole seconds until `key` expires; 0 when expired or absent.
    pub fn remaining_ttl(&self, key: &str) -> u64 {
        self.entries
            .get(key)
            .map(|entry| entry.ttl_remaining(self.clock.now_ms()))
            .unwrap_or(0)
    }

    // == Remove ==
    /// Evicts `key`, returning the value it held.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    // == Length ==
    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
