//! Aggregation service
//!
//! Orchestrates the upstream calls behind both endpoints. The top-users path
//! is memoized in the shared [`TtlCache`] and degrades to the last cached
//! value when the upstream fails; the posts path is always live.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::{fan_out, ranking, LATEST_POSTS_LIMIT, TOP_USERS_KEY, TOP_USERS_LIMIT};
use crate::cache::{EntryState, TtlCache};
use crate::config::Config;
use crate::error::{Result, UpstreamError};
use crate::models::{Post, PostKind, Source, UserRef, UserSummary};
use crate::upstream::Upstream;

/// Shared cache holding the memoized top-users result
pub type UsersCache = Arc<RwLock<TtlCache<Vec<UserSummary>>>>;

/// Top-users result together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum TopUsers {
    /// Fresh cache hit with its remaining TTL
    Cached { users: Vec<UserSummary>, ttl: u64 },
    /// Computed from the upstream in this call
    Fetched {
        users: Vec<UserSummary>,
        fetched_at: DateTime<Utc>,
    },
    /// Stale cache value served after an upstream failure
    Fallback { users: Vec<UserSummary>, ttl: u64 },
}

impl TopUsers {
    pub fn source(&self) -> Source {
        match self {
            TopUsers::Cached { .. } => Source::Cache,
            TopUsers::Fetched { .. } => Source::Api,
            TopUsers::Fallback { .. } => Source::CacheFallback,
        }
    }

    pub fn users(&self) -> &[UserSummary] {
        match self {
            TopUsers::Cached { users, .. }
            | TopUsers::Fetched { users, .. }
            | TopUsers::Fallback { users, .. } => users,
        }
    }
}

/// Aggregates upstream data for the users and posts endpoints.
pub struct Aggregator {
    upstream: Arc<dyn Upstream>,
    cache: UsersCache,
    /// Serializes top-users recomputation so concurrent misses fetch once
    refresh_lock: Mutex<()>,
    users_ttl: u64,
    fanout_limit: usize,
}

impl Aggregator {
    /// Creates an aggregator over an upstream and a shared cache.
    pub fn new(
        upstream: Arc<dyn Upstream>,
        cache: UsersCache,
        users_ttl: u64,
        fanout_limit: usize,
    ) -> Self {
        Self {
            upstream,
            cache,
            refresh_lock: Mutex::new(()),
            users_ttl,
            fanout_limit: fanout_limit.max(1),
        }
    }

    /// Creates an aggregator using TTL and fan-out width from `config`.
    pub fn from_config(upstream: Arc<dyn Upstream>, cache: UsersCache, config: &Config) -> Self {
        Self::new(upstream, cache, config.users_cache_ttl, config.fanout_limit)
    }

    /// Handle to the shared cache.
    pub fn cache(&self) -> &UsersCache {
        &self.cache
    }

    // == Top Users ==
    /// Returns the five users with the most posts.
    ///
    /// Serves a fresh cache hit unless `force_refresh` is set. On upstream
    /// failure, serves the last cached value regardless of expiry; the error
    /// is returned only when nothing was ever cached.
    pub async fn top_users(&self, force_refresh: bool) -> Result<TopUsers> {
        if !force_refresh {
            if let Some(hit) = self.cached_top_users().await {
                return Ok(hit);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        if !force_refresh {
            if let Some(hit) = self.cached_top_users().await {
                return Ok(hit);
            }
        }

        match self.compute_top_users().await {
            Ok(users) => {
                self.cache
                    .write()
                    .await
                    .set(TOP_USERS_KEY, users.clone(), self.users_ttl);
                info!("Top users fetched from upstream ({} ranked)", users.len());
                Ok(TopUsers::Fetched {
                    users,
                    fetched_at: Utc::now(),
                })
            }
            Err(err) => {
                error!(operation = "top_users", error = %err, "Error fetching top users");
                self.fallback_top_users().await.ok_or(err)
            }
        }
    }

    async fn cached_top_users(&self) -> Option<TopUsers> {
        let snapshot = self.cache.read().await.snapshot(TOP_USERS_KEY);
        match snapshot {
            Some(snap) if snap.state == EntryState::Fresh => {
                debug!("Top users cache hit, ttl={}s", snap.ttl);
                Some(TopUsers::Cached {
                    users: snap.value,
                    ttl: snap.ttl,
                })
            }
            _ => {
                debug!("Top users cache miss");
                None
            }
        }
    }

    async fn fallback_top_users(&self) -> Option<TopUsers> {
        // Stale reads ignore expiry; only a never-populated key yields None
        let snap = self.cache.read().await.snapshot(TOP_USERS_KEY)?;
        warn!(
            "Serving cached top users after upstream failure (state={:?}, ttl={}s)",
            snap.state, snap.ttl
        );
        Some(TopUsers::Fallback {
            users: snap.value,
            ttl: snap.ttl,
        })
    }

    async fn compute_top_users(&self) -> Result<Vec<UserSummary>> {
        let users = self.upstream.fetch_users().await?;
        let upstream = &self.upstream;

        let report = fan_out(users, self.fanout_limit, |user: UserRef| async move {
            upstream
                .fetch_user_posts(&user.id)
                .await
                .map(|posts| posts.len() as u64)
        })
        .await;

        if !report.is_complete() {
            for (user, err) in &report.failures {
                warn!("Fetching posts for user {} failed: {}", user.id, err);
            }
            return Err(UpstreamError::FanOut {
                failed: report.failures.into_iter().map(|(user, _)| user.id).collect(),
            });
        }

        let summaries = report
            .successes
            .into_iter()
            .map(|(user, post_count)| UserSummary::new(user, post_count))
            .collect();

        Ok(ranking::top_users(summaries, TOP_USERS_LIMIT))
    }

    // == Posts ==
    /// Returns posts ranked by `kind`. Never cached.
    pub async fn posts(&self, kind: PostKind) -> Result<Vec<Post>> {
        let posts = self.upstream.fetch_all_posts().await.map_err(|err| {
            error!(operation = "posts", kind = %kind, error = %err, "Error fetching posts");
            err
        })?;

        let selected = match kind {
            PostKind::Popular => ranking::most_commented(posts),
            PostKind::Latest => ranking::latest(posts, LATEST_POSTS_LIMIT),
        };
        debug!("Selected {} {} posts", selected.len(), kind);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeUpstream {
        users: Vec<UserRef>,
        post_counts: HashMap<String, usize>,
        all_posts: Vec<Post>,
        down: AtomicBool,
        broken_user: Option<String>,
        delay: Duration,
        users_calls: AtomicUsize,
        posts_calls: AtomicUsize,
    }

    impl FakeUpstream {
        fn with_counts(counts: &[(&str, usize)]) -> Self {
            Self {
                users: counts
                    .iter()
                    .map(|(id, _)| UserRef::new(*id, format!("name-{}", id)))
                    .collect(),
                post_counts: counts.iter().map(|(id, n)| (id.to_string(), *n)).collect(),
                ..Default::default()
            }
        }

        fn outage() -> UpstreamError {
            UpstreamError::Status {
                status: 503,
                url: "fake".to_string(),
            }
        }
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn fetch_users(&self) -> Result<Vec<UserRef>> {
            self.users_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.down.load(Ordering::SeqCst) {
                return Err(Self::outage());
            }
            Ok(self.users.clone())
        }

        async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
            if self.broken_user.as_deref() == Some(user_id) {
                return Err(Self::outage());
            }
            let count = self.post_counts.get(user_id).copied().unwrap_or(0);
            Ok(vec![Post(json!({"userId": user_id})); count])
        }

        async fn fetch_all_posts(&self) -> Result<Vec<Post>> {
            self.posts_calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(Self::outage());
            }
            Ok(self.all_posts.clone())
        }
    }

    fn aggregator(upstream: Arc<FakeUpstream>) -> (Aggregator, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = Arc::new(RwLock::new(TtlCache::with_clock(Arc::new(clock.clone()))));
        (Aggregator::new(upstream, cache, 60, 4), clock)
    }

    fn six_users() -> FakeUpstream {
        FakeUpstream::with_counts(&[("1", 3), ("2", 9), ("3", 9), ("4", 1), ("5", 5), ("6", 7)])
    }

    fn ids(result: &TopUsers) -> Vec<&str> {
        result.users().iter().map(|u| u.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_top_users_fetches_ranks_and_caches() {
        let upstream = Arc::new(six_users());
        let (agg, _clock) = aggregator(upstream.clone());

        let first = agg.top_users(false).await.unwrap();
        assert_eq!(first.source(), Source::Api);
        assert_eq!(ids(&first), vec!["2", "3", "6", "5", "1"]);
        assert_eq!(first.users()[0].post_count, 9);
        assert_eq!(first.users()[0].name, "name-2");

        let second = agg.top_users(false).await.unwrap();
        assert_eq!(second.source(), Source::Cache);
        assert_eq!(second.users(), first.users());
        assert!(matches!(second, TopUsers::Cached { ttl: 60, .. }));
        assert_eq!(upstream.users_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let upstream = Arc::new(six_users());
        let (agg, _clock) = aggregator(upstream.clone());

        agg.top_users(false).await.unwrap();
        let refreshed = agg.top_users(true).await.unwrap();

        assert_eq!(refreshed.source(), Source::Api);
        assert_eq!(upstream.users_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_is_refetched() {
        let upstream = Arc::new(six_users());
        let (agg, clock) = aggregator(upstream.clone());

        agg.top_users(false).await.unwrap();
        clock.advance(Duration::from_secs(61));

        let result = agg.top_users(false).await.unwrap();
        assert_eq!(result.source(), Source::Api);
        assert_eq!(upstream.users_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_serves_expired_value_on_failure() {
        let upstream = Arc::new(six_users());
        let (agg, clock) = aggregator(upstream.clone());

        let fresh = agg.top_users(false).await.unwrap();
        clock.advance(Duration::from_secs(120));
        upstream.down.store(true, Ordering::SeqCst);

        let result = agg.top_users(false).await.unwrap();
        assert_eq!(result.source(), Source::CacheFallback);
        assert_eq!(result.users(), fresh.users());
        assert!(matches!(result, TopUsers::Fallback { ttl: 0, .. }));
    }

    #[tokio::test]
    async fn test_fallback_on_forced_refresh_failure_keeps_ttl() {
        let upstream = Arc::new(six_users());
        let (agg, clock) = aggregator(upstream.clone());

        agg.top_users(false).await.unwrap();
        clock.advance(Duration::from_secs(20));
        upstream.down.store(true, Ordering::SeqCst);

        let result = agg.top_users(true).await.unwrap();
        assert!(matches!(result, TopUsers::Fallback { ttl: 40, .. }));
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_error() {
        let upstream = Arc::new(six_users());
        upstream.down.store(true, Ordering::SeqCst);
        let (agg, _clock) = aggregator(upstream);

        let result = agg.top_users(false).await;
        assert!(matches!(result, Err(UpstreamError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_single_user_failure_aborts_aggregation() {
        let upstream = Arc::new(FakeUpstream {
            broken_user: Some("3".to_string()),
            ..six_users()
        });
        let (agg, _clock) = aggregator(upstream);

        match agg.top_users(false).await {
            Err(UpstreamError::FanOut { failed }) => assert_eq!(failed, vec!["3".to_string()]),
            other => panic!("expected fan-out failure, got {:?}", other),
        }
        assert!(agg.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let upstream = Arc::new(FakeUpstream {
            delay: Duration::from_millis(50),
            ..six_users()
        });
        let (agg, _clock) = aggregator(upstream.clone());

        let (a, b) = tokio::join!(agg.top_users(false), agg.top_users(false));

        let mut sources = vec![a.unwrap().source(), b.unwrap().source()];
        sources.sort_by_key(|s| *s == Source::Cache);
        assert_eq!(sources, vec![Source::Api, Source::Cache]);
        assert_eq!(upstream.users_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_posts_popular_and_latest() {
        let upstream = Arc::new(FakeUpstream {
            all_posts: vec![
                Post(json!({"id": 1, "comments": [], "timestamp": "2024-01-01T00:00:00Z"})),
                Post(json!({"id": 2, "comments": [1, 2], "timestamp": "2024-01-03T00:00:00Z"})),
                Post(json!({"id": 3, "comments": [1, 2], "timestamp": "2024-01-02T00:00:00Z"})),
            ],
            ..Default::default()
        });
        let (agg, _clock) = aggregator(upstream.clone());

        let popular = agg.posts(PostKind::Popular).await.unwrap();
        assert_eq!(popular.len(), 2);

        let latest = agg.posts(PostKind::Latest).await.unwrap();
        assert_eq!(latest[0].0["id"], 2);
        assert_eq!(latest[2].0["id"], 1);

        assert_eq!(upstream.posts_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_posts_failure_has_no_fallback() {
        let upstream = Arc::new(FakeUpstream::default());
        upstream.down.store(true, Ordering::SeqCst);
        let (agg, _clock) = aggregator(upstream);

        assert!(agg.posts(PostKind::Popular).await.is_err());
    }
}
