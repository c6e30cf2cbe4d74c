//! Upstream Module
//!
//! Access to the upstream REST API that owns users and posts.

mod client;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Post, UserRef};

pub use client::HttpUpstream;

/// The three upstream resources the aggregator depends on.
///
/// Implementations must be safe to call concurrently; the aggregator fans
/// out many `fetch_user_posts` calls at once.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// All users, in the order the upstream lists them.
    async fn fetch_users(&self) -> Result<Vec<UserRef>>;

    /// Posts authored by one user.
    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>>;

    /// Every post.
    async fn fetch_all_posts(&self) -> Result<Vec<Post>>;
}
