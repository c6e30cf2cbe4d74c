//! HTTP client for the upstream API
//!
//! Every request carries the configured bearer token and a `max-age=60`
//! cache hint. Responses are JSON envelopes of the form `{ "data": ... }`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use super::Upstream;
use crate::config::Config;
use crate::error::{Result, UpstreamError};
use crate::models::{Post, UserRef};

/// Cache hint sent with every upstream request
const CACHE_HINT: &str = "max-age=60";

/// Upstream client backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: Url,
}

impl HttpUpstream {
    /// Builds a client with the default headers and timeout from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_HINT));

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.auth_token))
            .map_err(|_| UpstreamError::InvalidToken)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.upstream_timeout())
            .build()?;

        Self::with_client(client, &config.api_base_url)
    }

    /// Wraps a preconfigured reqwest client.
    ///
    /// `base_url` must be an absolute http(s) URL; any path it carries is kept
    /// as a prefix of every endpoint.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| UpstreamError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base URL, percent-encoding each one so an id
    /// can never change the path shape or add a query.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs `segments` under the base URL and decodes the body as JSON.
    async fn get_json(&self, segments: &[&str]) -> Result<Value> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await.map_err(|e| classify(e, &url))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch_users(&self) -> Result<Vec<UserRef>> {
        let body = self.get_json(&["test", "users"]).await?;
        parse_users(body)
    }

    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let body = self.get_json(&["test", "users", user_id, "posts"]).await?;
        parse_user_posts(body)
    }

    async fn fetch_all_posts(&self) -> Result<Vec<Post>> {
        let body = self.get_json(&["test", "posts"]).await?;
        parse_all_posts(body)
    }
}

fn classify(err: reqwest::Error, url: &Url) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(url.to_string())
    } else {
        UpstreamError::Request(err)
    }
}

/// Removes and returns the `data` field of an envelope.
fn take_data(body: Value) -> Option<Value> {
    match body {
        Value::Object(mut root) => root.remove("data"),
        _ => None,
    }
}

/// `{ "data": { "<id>": "<name>", ... } }`, preserving key order.
pub(crate) fn parse_users(body: Value) -> Result<Vec<UserRef>> {
    match take_data(body) {
        Some(Value::Object(users)) => Ok(users
            .into_iter()
            .map(|(id, name)| match name {
                Value::String(name) => UserRef::new(id, name),
                other => UserRef::new(id, other.to_string()),
            })
            .collect()),
        _ => Err(UpstreamError::InvalidShape(
            "invalid users data structure".to_string(),
        )),
    }
}

/// `{ "data": [ ... ] }`; a missing or null `data` means no posts.
pub(crate) fn parse_user_posts(body: Value) -> Result<Vec<Post>> {
    match take_data(body) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.into_iter().map(Post).collect()),
        Some(_) => Err(UpstreamError::InvalidShape(
            "invalid user posts data structure".to_string(),
        )),
    }
}

/// `{ "data": [ ... ] }`; `data` is required.
pub(crate) fn parse_all_posts(body: Value) -> Result<Vec<Post>> {
    match take_data(body) {
        Some(Value::Array(items)) => Ok(items.into_iter().map(Post).collect()),
        _ => Err(UpstreamError::InvalidShape(
            "invalid posts data structure".to_string(),
        )),
    }
}
