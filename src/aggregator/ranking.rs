//! Pure ranking functions over users and posts.

use chrono::{DateTime, Utc};

use crate::models::{Post, UserSummary};

/// Highest post counts first, keeping input order among ties, truncated to `limit`.
pub fn top_users(mut users: Vec<UserSummary>, limit: usize) -> Vec<UserSummary> {
    // sort_by is stable
    users.sort_by(|a, b| b.post_count.cmp(&a.post_count));
    users.truncate(limit);
    users
}

/// Every post tied for the highest comment count, in input order.
pub fn most_commented(posts: Vec<Post>) -> Vec<Post> {
    let max = posts.iter().map(Post::comment_count).max().unwrap_or(0);
    posts
        .into_iter()
        .filter(|post| post.comment_count() == max)
        .collect()
}

/// The `limit` most recent posts, newest first.
///
/// Posts without a usable timestamp sort as the Unix epoch; ties keep input order.
pub fn latest(posts: Vec<Post>, limit: usize) -> Vec<Post> {
    let mut keyed: Vec<(DateTime<Utc>, Post)> = posts
        .into_iter()
        .map(|post| (post.recency_key(), post))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().take(limit).map(|(_, post)| post).collect()
}
