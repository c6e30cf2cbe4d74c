//! Cache Entry Module
//!
//! Defines individual cache entries and the freshness state derived from them.

// == Entry State ==
/// Freshness of a key at a single instant.
///
/// Every cache accessor derives this from one clock reading, so reads never
/// disagree about whether an entry has expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Entry exists and the clock has not passed its expiration time
    Fresh,
    /// Entry exists but the clock is past its expiration time; still available for stale reads
    Expired,
    /// No entry for the key
    Absent,
}

// == Cache Entry ==
/// A single cached value with its expiration metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stored at `now_ms` that lives for `ttl_seconds`.
    pub fn new(value: V, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now_ms`.
    ///
    /// An entry is expired only once the current time is past the expiration
    /// time. A read at exactly `expires_at` still sees the value, so a TTL of 0
    /// is fresh for the millisecond it was written in.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Returns the entry's state at `now_ms`. Never `Absent`.
    pub fn state_at(&self, now_ms: u64) -> EntryState {
        if self.is_expired_at(now_ms) {
            EntryState::Expired
        } else {
            EntryState::Fresh
        }
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds, floored at 0.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Remaining TTL in whole seconds, floored at 0.
    pub fn ttl_remaining(&self, now_ms: u64) -> u64 {
        self.ttl_remaining_ms(now_ms) / 1000
    }
}
