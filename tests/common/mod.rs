//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, Router};
use post_ranker::error::{Result, UpstreamError};
use post_ranker::models::{Post, UserRef};
use post_ranker::upstream::Upstream;
use serde_json::{json, Value};

/// In-memory upstream with call counters and an outage switch.
#[derive(Default)]
pub struct FakeUpstream {
    pub users: Vec<(String, usize)>,
    pub posts: Vec<Value>,
    pub down: AtomicBool,
    pub users_calls: AtomicUsize,
    pub posts_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn with_post_counts(counts: &[(&str, usize)]) -> Self {
        Self {
            users: counts.iter().map(|(id, n)| (id.to_string(), *n)).collect(),
            ..Default::default()
        }
    }

    pub fn with_posts(posts: Vec<Value>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.users_calls.load(Ordering::SeqCst) + self.posts_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(UpstreamError::Status {
                status: 502,
                url: "fake".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn fetch_users(&self) -> Result<Vec<UserRef>> {
        self.users_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .users
            .iter()
            .map(|(id, _)| UserRef::new(id.clone(), format!("User {}", id)))
            .collect())
    }

    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        self.check()?;
        let count = self
            .users
            .iter()
            .find(|(id, _)| id == user_id)
            .map_or(0, |(_, n)| *n);
        Ok(vec![Post(json!({"userId": user_id})); count])
    }

    async fn fetch_all_posts(&self) -> Result<Vec<Post>> {
        self.posts_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.posts.iter().cloned().map(Post).collect())
    }
}

/// The six-user fixture: ranking yields 2, 3, 6, 5, 1.
pub fn six_users() -> Arc<FakeUpstream> {
    Arc::new(FakeUpstream::with_post_counts(&[
        ("1", 3),
        ("2", 9),
        ("3", 9),
        ("4", 1),
        ("5", 5),
        ("6", 7),
    ]))
}

pub async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
