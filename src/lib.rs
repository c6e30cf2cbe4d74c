//! Post Ranker - An aggregation backend over an upstream users/posts API
//!
//! Ranks users by post count and posts by popularity or recency, memoizing
//! the user ranking with a TTL cache that doubles as a stale fallback.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod upstream;

pub use aggregator::Aggregator;
pub use api::AppState;
pub use config::Config;
