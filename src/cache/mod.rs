//! Cache Module
//!
//! Provides the in-memory TTL cache backing the top-users aggregation.
//! Expiry is evaluated lazily; expired entries stay readable for fallback.

mod clock;
mod entry;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryState};
pub use store::{Snapshot, TtlCache};
