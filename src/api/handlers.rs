//! API Handlers
//!
//! HTTP request handlers for each aggregation endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::aggregator::{Aggregator, TopUsers, UsersCache};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{PostsQuery, PostsResponse, UsersQuery, UsersResponse, INVALID_TYPE};
use crate::upstream::{HttpUpstream, Upstream};

/// Application state shared across all handlers.
///
/// The aggregator owns the process-wide cache; cloning the state shares it.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl AppState {
    /// Creates a new AppState around an aggregator.
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }

    /// Creates a new AppState with a fresh cache over the given upstream.
    pub fn with_upstream(upstream: Arc<dyn Upstream>, config: &Config) -> Self {
        let cache: UsersCache = Arc::new(RwLock::new(TtlCache::new()));
        Self::new(Aggregator::from_config(upstream, cache, config))
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the HTTP upstream client and an empty cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = HttpUpstream::from_config(config)?;
        Ok(Self::with_upstream(Arc::new(upstream), config))
    }
}

/// Handler for GET /users
///
/// Returns the top five users by post count; `?refresh=true` bypasses the cache.
/// A query string that does not deserialize (e.g. a repeated `refresh`) is
/// treated as no refresh.
pub async fn users_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<UsersQuery>, QueryRejection>,
) -> std::result::Result<Json<UsersResponse>, ApiError> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!("Ignoring users query string: {}", rejection.body_text());
            UsersQuery::default()
        }
    };

    let top = state
        .aggregator
        .top_users(query.force_refresh())
        .await
        .map_err(|_| ApiError::Upstream("Failed to fetch top users".to_string()))?;

    Ok(Json(users_response(top)))
}

fn users_response(top: TopUsers) -> UsersResponse {
    match top {
        TopUsers::Cached { users, ttl } => UsersResponse::from_cache(users, ttl),
        TopUsers::Fetched { users, fetched_at } => UsersResponse::from_api(users, fetched_at),
        TopUsers::Fallback { users, ttl } => UsersResponse::from_fallback(users, ttl),
    }
}

/// Handler for GET /posts
///
/// Returns popular (`?type=popular`, default) or latest (`?type=latest`) posts.
/// The type is validated before any upstream call; a query string that does
/// not deserialize (e.g. a repeated `type`) is rejected the same way.
pub async fn posts_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<PostsQuery>, QueryRejection>,
) -> std::result::Result<Json<PostsResponse>, ApiError> {
    let kind = match query {
        Ok(Query(query)) => query.validate().map_err(|msg| {
            warn!("Rejected posts request with type {:?}", query.kind);
            ApiError::Validation(msg)
        })?,
        Err(rejection) => {
            warn!("Rejected posts query string: {}", rejection.body_text());
            return Err(ApiError::Validation(INVALID_TYPE.to_string()));
        }
    };

    let posts = state
        .aggregator
        .posts(kind)
        .await
        .map_err(|_| ApiError::Upstream("Failed to fetch posts".to_string()))?;

    Ok(Json(PostsResponse::new(kind, posts, Utc::now())))
}

/// Handler for GET /test
pub async fn health_handler() -> &'static str {
    "API working"
}
