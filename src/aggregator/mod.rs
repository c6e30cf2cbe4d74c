//! Aggregator Module
//!
//! Combines upstream calls into ranked results, memoizing the top-users
//! computation and falling back to stale data when the upstream fails.

mod fanout;
mod ranking;
mod service;


pub use fanout::{fan_out, FanOutReport};
pub use ranking::{latest, most_commented, top_users};
pub use service::{Aggregator, TopUsers, UsersCache};

// == Public Constants ==
/// Cache key for the memoized top-users result
pub const TOP_USERS_KEY: &str = "topFiveUsers";

/// Number of users returned by the top-users ranking
pub const TOP_USERS_LIMIT: usize = 5;

/// Number of posts returned by the latest-posts ranking
pub const LATEST_POSTS_LIMIT: usize = 5;
