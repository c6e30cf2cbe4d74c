//! Response DTOs for the aggregation API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{Post, PostKind, UserSummary};

/// Where a response's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Fresh cache hit
    Cache,
    /// Computed from the upstream API in this request
    Api,
    /// Stale cache entry served because the upstream failed
    CacheFallback,
}

/// Response body for GET /users
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    /// Always "success"
    pub status: &'static str,
    /// Human-readable outcome
    pub message: String,
    /// Top users, highest post count first
    pub data: Vec<UserSummary>,
    /// Origin of `data`
    pub source: Source,
    /// Seconds the cached value remains fresh (cache sources only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// When `data` was fetched (api source only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
}

impl UsersResponse {
    /// Fresh cache hit.
    pub fn from_cache(data: Vec<UserSummary>, ttl: u64) -> Self {
        Self {
            status: "success",
            message: "Top 5 users fetched from cache".to_string(),
            data,
            source: Source::Cache,
            ttl: Some(ttl),
            fetched_at: None,
        }
    }

    /// Live upstream result.
    pub fn from_api(data: Vec<UserSummary>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            status: "success",
            message: "Top 5 users fetched successfully".to_string(),
            data,
            source: Source::Api,
            ttl: None,
            fetched_at: Some(iso_timestamp(fetched_at)),
        }
    }

    /// Stale value served after an upstream failure.
    pub fn from_fallback(data: Vec<UserSummary>, ttl: u64) -> Self {
        Self {
            status: "success",
            message: "Returning cached results due to error".to_string(),
            data,
            source: Source::CacheFallback,
            ttl: Some(ttl),
            fetched_at: None,
        }
    }
}

/// Response body for GET /posts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    /// Always "success"
    pub status: &'static str,
    /// Human-readable outcome
    pub message: String,
    /// Selected posts, as returned upstream
    pub data: Vec<Post>,
    /// Always `api`; this path is not cached
    pub source: Source,
    /// When `data` was fetched
    pub fetched_at: String,
}

impl PostsResponse {
    /// Creates a new PostsResponse
    pub fn new(kind: PostKind, data: Vec<Post>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            status: "success",
            message: format!("{} posts fetched successfully", kind.label()),
            data,
            source: Source::Api,
            fetched_at: iso_timestamp(fetched_at),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: &'static str,
    /// Error message describing what went wrong
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Vec<UserSummary> {
        vec![UserSummary {
            id: "1".to_string(),
            name: "Ada".to_string(),
            post_count: 3,
        }]
    }

    #[test]
    fn test_source_serializes_kebab_case() {
        assert_eq!(serde_json::to_value(Source::Cache).unwrap(), json!("cache"));
        assert_eq!(serde_json::to_value(Source::Api).unwrap(), json!("api"));
        assert_eq!(
            serde_json::to_value(Source::CacheFallback).unwrap(),
            json!("cache-fallback")
        );
    }

    #[test]
    fn test_cache_response_has_ttl_and_no_fetched_at() {
        let json = serde_json::to_value(UsersResponse::from_cache(sample(), 42)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["source"], "cache");
        assert_eq!(json["ttl"], 42);
        assert!(json.get("fetchedAt").is_none());
        assert_eq!(json["data"][0]["postCount"], 3);
    }

    #[test]
    fn test_api_response_has_fetched_at() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(UsersResponse::from_api(sample(), at)).unwrap();
        assert_eq!(json["source"], "api");
        assert_eq!(json["fetchedAt"], "2024-05-01T12:00:00.000Z");
        assert!(json.get("ttl").is_none());
    }

    #[test]
    fn test_fallback_response() {
        let json = serde_json::to_value(UsersResponse::from_fallback(sample(), 0)).unwrap();
        assert_eq!(json["source"], "cache-fallback");
        assert_eq!(json["ttl"], 0);
        assert_eq!(json["message"], "Returning cached results due to error");
    }

    #[test]
    fn test_posts_response_message() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let resp = PostsResponse::new(PostKind::Latest, vec![], at);
        assert_eq!(resp.message, "Latest posts fetched successfully");
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_value(ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(json, json!({"status": "error", "message": "Something went wrong"}));
    }
}
