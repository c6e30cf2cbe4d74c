//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Configuration loading failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

/// Server configuration parameters.
///
/// Everything except the upstream base URL has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API base URL, without trailing slash
    pub api_base_url: String,
    /// Bearer token sent with every upstream request
    pub auth_token: String,
    /// HTTP server port
    pub server_port: u16,
    /// Seconds the top-users result stays fresh
    pub users_cache_ttl: u64,
    /// Per-call upstream timeout in seconds
    pub upstream_timeout: u64,
    /// Maximum concurrent per-user post fetches
    pub fanout_limit: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_BASE_URL` - Upstream base URL (required)
    /// - `AUTH_TOKEN` - Bearer token (default: empty)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `USERS_CACHE_TTL` - Top-users TTL in seconds (default: 60)
    /// - `UPSTREAM_TIMEOUT_SECS` - Per-call timeout in seconds (default: 10)
    /// - `FANOUT_LIMIT` - Concurrent per-user fetches (default: 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("API_BASE_URL"))?;

        Ok(Self {
            api_base_url,
            auth_token: lookup("AUTH_TOKEN").unwrap_or(defaults.auth_token),
            server_port: parsed(&lookup, "PORT").unwrap_or(defaults.server_port),
            users_cache_ttl: parsed(&lookup, "USERS_CACHE_TTL")
                .unwrap_or(defaults.users_cache_ttl),
            upstream_timeout: parsed(&lookup, "UPSTREAM_TIMEOUT_SECS")
                .unwrap_or(defaults.upstream_timeout),
            fanout_limit: parsed(&lookup, "FANOUT_LIMIT")
                .unwrap_or(defaults.fanout_limit)
                .max(1),
        })
    }

    /// Upstream timeout as a Duration.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

/// Parses a variable, treating unparseable values as unset.
fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000".to_string(),
            auth_token: String::new(),
            server_port: 3000,
            users_cache_ttl: 60,
            upstream_timeout: 10,
            fanout_limit: 8,
        }
    }
}
