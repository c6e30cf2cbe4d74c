//! Domain types shared by the upstream client and the aggregator.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user as listed by the upstream API, in upstream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A ranked user with the number of posts they have authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub post_count: u64,
}

impl UserSummary {
    pub fn new(user: UserRef, post_count: u64) -> Self {
        Self {
            id: user.id,
            name: user.name,
            post_count,
        }
    }
}

/// An upstream post, passed through to callers unchanged.
///
/// Only `comments` and `timestamp` are interpreted; every other field is
/// opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(pub Value);

impl Post {
    /// Number of comments, or 0 when `comments` is missing or not an array.
    pub fn comment_count(&self) -> usize {
        self.0
            .get("comments")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Parsed `timestamp`, if present and recognizable.
    ///
    /// Accepts RFC 3339 strings, `YYYY-MM-DD HH:MM:SS` strings (read as UTC)
    /// and integer Unix milliseconds.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.0.get("timestamp")? {
            Value::String(raw) => parse_timestamp(raw),
            Value::Number(ms) => ms.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }

    /// Sort key for recency; posts without a usable timestamp sort as the epoch.
    pub fn recency_key(&self) -> DateTime<Utc> {
        self.timestamp().unwrap_or(DateTime::UNIX_EPOCH)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
