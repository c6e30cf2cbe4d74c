//! Request DTOs for the aggregation API
//!
//! Defines the query strings accepted by the HTTP endpoints.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Message returned for any unusable `type` parameter
pub const INVALID_TYPE: &str = "Invalid type parameter. Use 'popular' or 'latest'";

/// Query string for GET /users
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersQuery {
    /// `true` bypasses the cache; any other value is ignored
    #[serde(default)]
    pub refresh: Option<String>,
}

impl UsersQuery {
    /// Returns true only for the exact value `true`.
    pub fn force_refresh(&self) -> bool {
        self.refresh.as_deref() == Some("true")
    }
}

/// Query string for GET /posts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostsQuery {
    /// Ranking kind, `popular` when omitted
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl PostsQuery {
    /// Validates the requested ranking kind.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<PostKind, String> {
        match self.kind.as_deref() {
            None => Ok(PostKind::Popular),
            Some(raw) => raw.parse(),
        }
    }
}

/// How posts are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostKind {
    /// Every post tied for the highest comment count
    #[default]
    Popular,
    /// The five most recent posts
    Latest,
}

impl PostKind {
    /// Capitalized label used in response messages.
    pub fn label(self) -> &'static str {
        match self {
            PostKind::Popular => "Popular",
            PostKind::Latest => "Latest",
        }
    }
}

impl FromStr for PostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(PostKind::Popular),
            "latest" => Ok(PostKind::Latest),
            _ => Err(INVALID_TYPE.to_string()),
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKind::Popular => f.write_str("popular"),
            PostKind::Latest => f.write_str("latest"),
        }
    }
}
